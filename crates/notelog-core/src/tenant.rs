//! Per-tenant store handles.
//!
//! The process entry point owns one [`TenantRegistry`]. Looking up a tenant
//! takes the registry lock only long enough to find or open its entry;
//! all work on a tenant's log then runs under that tenant's own lock via
//! [`Tenant::with_store`], so requests for one user apply one at a time
//! while different users proceed in parallel. The same call also holds the
//! store's lock file, which orders it against other processes sharing the
//! data directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::config::ServerConfig;
use crate::error::ErrorCode;
use crate::filename::filenamify;
use crate::store::{FileStore, StoreError};

/// Subdirectory of a tenant dir that receives auxiliary bundle files.
pub const AUX_FILES_DIR: &str = "files";

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("tenant id must not be empty")]
    EmptyId,

    #[error("cannot open store for tenant '{tenant}': {source}")]
    Open {
        tenant: String,
        #[source]
        source: StoreError,
    },

    #[error("store of tenant '{tenant}' is unavailable: {source}")]
    Store {
        tenant: String,
        #[source]
        source: StoreError,
    },

    #[error("{0} lock poisoned by a panicking request")]
    Poisoned(&'static str),
}

impl TenantError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyId => ErrorCode::NoteNotFound,
            Self::Open { source, .. } | Self::Store { source, .. } => source.code(),
            Self::Poisoned(_) => ErrorCode::InternalUnexpected,
        }
    }
}

/// One user's log plus the lock that serializes access to it.
#[derive(Debug)]
pub struct Tenant {
    id: String,
    dir: PathBuf,
    store: Mutex<FileStore>,
}

impl Tenant {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where auxiliary files from uploaded bundles are written.
    #[must_use]
    pub fn aux_files_dir(&self) -> PathBuf {
        self.dir.join(AUX_FILES_DIR)
    }

    /// Run `f` with exclusive access to this tenant's store, holding its
    /// lock file and seeing every record other processes appended.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Poisoned`] if an earlier holder panicked and
    /// [`TenantError::Store`] if the lock file cannot be taken in time.
    pub fn with_store<T>(&self, f: impl FnOnce(&mut FileStore) -> T) -> Result<T, TenantError> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| TenantError::Poisoned("tenant"))?;
        store.with_lock(f).map_err(|source| TenantError::Store {
            tenant: self.id.clone(),
            source,
        })
    }
}

/// Tenant id → lazily opened [`Tenant`].
#[derive(Debug)]
pub struct TenantRegistry {
    config: ServerConfig,
    tenants: Mutex<HashMap<String, Arc<Tenant>>>,
}

impl TenantRegistry {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            tenants: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Directory holding `tenant_id`'s log.
    #[must_use]
    pub fn tenant_dir(&self, tenant_id: &str) -> PathBuf {
        self.config.data_dir.join(filenamify(tenant_id))
    }

    /// Look up `tenant_id`, opening its store on first use.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Open`] if the store cannot be opened.
    pub fn tenant(&self, tenant_id: &str) -> Result<Arc<Tenant>, TenantError> {
        if tenant_id.trim().is_empty() {
            return Err(TenantError::EmptyId);
        }
        let mut tenants = self
            .tenants
            .lock()
            .map_err(|_| TenantError::Poisoned("registry"))?;
        if let Some(tenant) = tenants.get(tenant_id) {
            return Ok(Arc::clone(tenant));
        }

        let dir = self.tenant_dir(tenant_id);
        let store = FileStore::open(
            &dir,
            &self.config.index_file_name,
            &self.config.data_file_name,
            self.config.store_options(),
        )
        .map_err(|source| TenantError::Open {
            tenant: tenant_id.to_string(),
            source,
        })?;
        info!(tenant = tenant_id, dir = %dir.display(), "opened tenant store");

        let tenant = Arc::new(Tenant {
            id: tenant_id.to_string(),
            dir,
            store: Mutex::new(store),
        });
        tenants.insert(tenant_id.to_string(), Arc::clone(&tenant));
        Ok(tenant)
    }

    /// Number of tenants opened so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tenants.lock().map_or(0, |t| t.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

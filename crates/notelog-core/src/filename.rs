//! Turn arbitrary strings (emails, auxiliary file names) into safe file names.

/// Longest file name produced by [`filenamify`], in bytes.
pub const MAX_FILE_NAME_LEN: usize = 255;

const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const RESERVED_NAMES: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Sanitize `name` for use as a single path component.
///
/// - `<>:"/\|?*` and control characters become `_`.
/// - Trailing dots and spaces are trimmed.
/// - Windows device names (`con`, `lpt1`, ...) and names that are empty,
///   `.` or `..` after trimming get a leading `_`.
/// - The result is capped at [`MAX_FILE_NAME_LEN`] bytes on a char boundary.
#[must_use]
pub fn filenamify(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_control() || RESERVED_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = replaced.trim_end_matches(['.', ' ']);

    let stem = trimmed.split('.').next().unwrap_or_default();
    let mut out = if trimmed.is_empty()
        || RESERVED_NAMES.contains(&stem.to_ascii_lowercase().as_str())
    {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    };

    if out.len() > MAX_FILE_NAME_LEN {
        let mut end = MAX_FILE_NAME_LEN;
        while !out.is_char_boundary(end) {
            end -= 1;
        }
        out.truncate(end);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_names() {
        assert_eq!(filenamify("notes.txt"), "notes.txt");
        assert_eq!(filenamify("user@example.com"), "user@example.com");
    }

    #[test]
    fn replaces_reserved_and_control_chars() {
        assert_eq!(filenamify("a/b\\c:d*e?f\"g<h>i|j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(filenamify("tab\there"), "tab_here");
    }

    #[test]
    fn trims_trailing_dots_and_spaces() {
        assert_eq!(filenamify("name. . "), "name");
    }

    #[test]
    fn guards_device_and_dot_names() {
        assert_eq!(filenamify("CON"), "_CON");
        assert_eq!(filenamify("lpt1.txt"), "_lpt1.txt");
        assert_eq!(filenamify(".."), "_");
        assert_eq!(filenamify(""), "_");
    }

    #[test]
    fn caps_length_on_char_boundary() {
        let long = "é".repeat(200);
        let out = filenamify(&long);
        assert!(out.len() <= MAX_FILE_NAME_LEN);
        assert!(out.chars().all(|c| c == 'é'));
    }
}

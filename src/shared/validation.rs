use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Characters that may not appear in a stored filename
    /// - Kept: ASCII letters, digits, "-", "_", "."
    /// - Everything else is dropped after whitespace has become "_"
    pub static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();

    /// Runs of whitespace, collapsed into a single underscore
    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Reduce an uploaded filename to a string safe for use as a storage key
///
/// Path separators are dropped with the other unsafe characters, so the
/// result never escapes the upload directory. May return an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let spaced = WHITESPACE_RUN.replace_all(name.trim(), "_");
    let safe = UNSAFE_FILENAME_CHARS.replace_all(&spaced, "");
    safe.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Lower-cased text after the last "." of a filename
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my diagram.png"), "my_diagram.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename("résumé final.pdf"), "rsum_final.pdf");
        assert_eq!(sanitize_filename("__.hidden."), "hidden");
        assert_eq!(sanitize_filename("???"), "");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("a.PNG"), Some("png".to_string()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension(".png"), Some("png".to_string()));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension("trailing."), None);
    }
}

//! Shared key generation for storage backends.
//!
//! Key format: `{user_id}/{random_token}_{filename}`. The random token makes
//! keys collision-free even when the same user uploads the same filename
//! twice.

use uuid::Uuid;

const MAX_FILENAME_LENGTH: usize = 255;

/// Build the storage key for an uploaded object.
pub fn build_object_key(user_id: Uuid, filename: &str) -> String {
    format!("{}/{}_{}", user_id, Uuid::new_v4(), sanitize_filename(filename))
}

/// Sanitize a filename for use inside a storage key.
///
/// Strips any path components, replaces characters outside
/// `[A-Za-z0-9._-]` with `_`, and truncates overlong names. Degenerate
/// inputs fall back to `"upload"` so key construction never fails.
pub fn sanitize_filename(filename: &str) -> String {
    let filename_only = std::path::Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(|c| c == '.' || c == '_').is_empty() {
        return "upload".to_string();
    }

    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_are_user_scoped_and_unique() {
        let user_id = Uuid::new_v4();
        let a = build_object_key(user_id, "page.png");
        let b = build_object_key(user_id, "page.png");

        assert!(a.starts_with(&format!("{}/", user_id)));
        assert!(a.ends_with("_page.png"));
        assert_ne!(a, b);
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("foo/../bar.txt"), "bar.txt");
        assert_eq!(sanitize_filename("/etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("dir\\name.png"), "dir_name.png");
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("my file (1).png"), "my_file__1_.png");
        assert_eq!(sanitize_filename("truyện.txt"), "truyện.txt");
    }

    #[test]
    fn sanitize_falls_back_on_degenerate_names() {
        assert_eq!(sanitize_filename(""), "upload");
        assert_eq!(sanitize_filename(".."), "upload");
        assert_eq!(sanitize_filename("...."), "upload");
    }
}

//! Preset avatar catalog.
//!
//! Avatars are image files in `<public_dir>/avatars/`. Users pick one of
//! them by its relative path (`avatars/<file>`); nothing is uploaded.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// URL prefix (and relative path prefix) of catalog entries.
pub const AVATAR_PREFIX: &str = "avatars/";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "svg", "gif"];

/// Errors from the avatar catalog.
#[derive(Debug, Error)]
pub enum AvatarError {
    /// The reference does not name a catalog image.
    #[error("avatar is not in the catalog")]
    NotInCatalog,

    /// Reading the catalog directory failed.
    #[error("failed to read avatar catalog: {0}")]
    Io(#[from] io::Error),
}

/// The set of preset avatar images on disk.
#[derive(Debug, Clone)]
pub struct AvatarCatalog {
    dir: PathBuf,
}

impl AvatarCatalog {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory the images are served from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All catalog entries as sorted `avatars/<file>` paths.
    ///
    /// A missing directory is an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns `AvatarError::Io` if the directory exists but can't be read.
    pub async fn list(&self) -> Result<Vec<String>, AvatarError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut avatars = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && is_image_name(name)
            {
                avatars.push(format!("{AVATAR_PREFIX}{name}"));
            }
        }

        avatars.sort();
        Ok(avatars)
    }

    /// Resolve a user-supplied reference to its catalog path.
    ///
    /// Accepts `avatars/<file>` or a bare `<file>`, and returns the
    /// `avatars/<file>` form.
    ///
    /// # Errors
    ///
    /// Returns `AvatarError::NotInCatalog` if the reference is not a plain
    /// image file name or no such file exists.
    pub async fn resolve(&self, reference: &str) -> Result<String, AvatarError> {
        let reference = reference.trim();
        let name = reference.strip_prefix(AVATAR_PREFIX).unwrap_or(reference);

        if !is_image_name(name) {
            return Err(AvatarError::NotInCatalog);
        }

        match tokio::fs::metadata(self.dir.join(name)).await {
            Ok(meta) if meta.is_file() => Ok(format!("{AVATAR_PREFIX}{name}")),
            Ok(_) => Err(AvatarError::NotInCatalog),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(AvatarError::NotInCatalog),
            Err(e) => Err(e.into()),
        }
    }
}

/// A single path component with an image extension.
fn is_image_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return false;
    }

    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalog_with(files: &[&str]) -> (tempfile::TempDir, AvatarCatalog) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), b"img").unwrap();
        }
        let catalog = AvatarCatalog::new(dir.path().to_path_buf());
        (dir, catalog)
    }

    #[test]
    fn test_image_names() {
        assert!(is_image_name("fox.png"));
        assert!(is_image_name("Owl.JPEG"));
        assert!(!is_image_name("notes.txt"));
        assert!(!is_image_name("../secret.png"));
        assert!(!is_image_name("nested/fox.png"));
        assert!(!is_image_name(".hidden.png"));
        assert!(!is_image_name(""));
    }

    #[tokio::test]
    async fn test_list_sorted_images_only() {
        let (dir, catalog) = catalog_with(&["owl.svg", "fox.png", "readme.md"]);
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        assert_eq!(
            catalog.list().await.unwrap(),
            vec!["avatars/fox.png".to_string(), "avatars/owl.svg".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let catalog = AvatarCatalog::new(PathBuf::from("/nonexistent/avatars"));
        assert!(catalog.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_accepts_both_forms() {
        let (_dir, catalog) = catalog_with(&["fox.png"]);

        assert_eq!(catalog.resolve("avatars/fox.png").await.unwrap(), "avatars/fox.png");
        assert_eq!(catalog.resolve("fox.png").await.unwrap(), "avatars/fox.png");
    }

    #[tokio::test]
    async fn test_resolve_rejects_unknown_and_traversal() {
        let (_dir, catalog) = catalog_with(&["fox.png"]);

        for reference in ["avatars/bear.png", "avatars/../fox.png", "/etc/passwd", "fox.txt"] {
            assert!(
                matches!(
                    catalog.resolve(reference).await,
                    Err(AvatarError::NotInCatalog)
                ),
                "{reference} should be rejected"
            );
        }
    }
}

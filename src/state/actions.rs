/// Image actions shared by the gallery, the results and the table:
/// download, delete confirmation and the focus overlay.

use rfd::{AsyncMessageDialog, MessageButtons, MessageDialogResult, MessageLevel};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

use crate::api::{ApiClient, FetchedImage, ImageMetadata};
use crate::error::{ClientError, Result};

/// Name used when the server does not say what the file is called
pub const FALLBACK_FILENAME: &str = "image.jpg";

/// Filename from a `Content-Disposition` header value.
///
/// Takes whatever follows `filename=`, drops quotes and any following
/// parameters, and strips directory components.
pub fn filename_from_disposition(header: Option<&str>) -> String {
    header
        .and_then(|value| value.split("filename=").nth(1))
        .map(|rest| rest.split(';').next().unwrap_or(rest).trim().trim_matches('"'))
        .map(|name| name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name).trim())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// `filename`, then `stem (1).ext`, `stem (2).ext`, ...
pub fn candidate_names(filename: &str) -> impl Iterator<Item = String> {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().to_string());

    std::iter::once(filename.to_string()).chain((1u32..).map(move |n| match &extension {
        Some(ext) => format!("{} ({}).{}", stem, n, ext),
        None => format!("{} ({})", stem, n),
    }))
}

/// Move `staged` into `dir` under the first free candidate name.
///
/// Each attempt is an atomic no-clobber persist, so a file that appears
/// at a candidate path at any point is never replaced. On failure the
/// staging file is dropped, which deletes it.
pub fn persist_unique(staged: NamedTempFile, dir: &Path, filename: &str) -> Result<PathBuf> {
    let mut staged = staged;
    for name in candidate_names(filename) {
        let destination = dir.join(&name);
        match staged.persist_noclobber(&destination) {
            Ok(_) => return Ok(destination),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %destination.display(), "Name taken, trying the next one");
                staged = e.file;
            }
            Err(e) => return Err(e.error.into()),
        }
    }

    Err(ClientError::Io(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for {}", filename),
    )))
}

/// Write a fetched image into `dir` under the name the server gave it
pub fn save_download(dir: &Path, fetched: &FetchedImage) -> Result<PathBuf> {
    let filename = filename_from_disposition(fetched.content_disposition.as_deref());
    fs::create_dir_all(dir)?;

    let mut staged = tempfile::Builder::new()
        .prefix(".art-gallery-")
        .suffix(".part")
        .tempfile_in(dir)?;
    staged.write_all(&fetched.bytes)?;
    debug!(staging = %staged.path().display(), filename = %filename, "Download staged");

    persist_unique(staged, dir, &filename)
}

/// Fetch `url` and save it into `dir`
pub async fn download_image(client: ApiClient, url: String, dir: PathBuf) -> std::result::Result<PathBuf, String> {
    let fetched = client.fetch_image(&url).await.map_err(|e| e.to_string())?;

    // File I/O off the UI thread
    let saved = tokio::task::spawn_blocking(move || save_download(&dir, &fetched))
        .await
        .map_err(|e| format!("Task join error: {}", e))?
        .map_err(|e| e.to_string())?;

    info!(url = %url, path = %saved.display(), "💾 Image downloaded");
    Ok(saved)
}

/// Ask before removing a tile. Removal is local only; the server keeps the image.
pub async fn confirm_delete() -> bool {
    let answer = AsyncMessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Delete image")
        .set_description("Are you sure you want to delete this image?")
        .set_buttons(MessageButtons::YesNo)
        .show()
        .await;

    matches!(answer, MessageDialogResult::Yes)
}

/// Native alert box
pub async fn alert(level: MessageLevel, title: String, description: String) {
    if matches!(level, MessageLevel::Error) {
        error!(title = %title, "{}", description);
    }
    AsyncMessageDialog::new()
        .set_level(level)
        .set_title(title.as_str())
        .set_description(description.as_str())
        .set_buttons(MessageButtons::Ok)
        .show()
        .await;
}

/// Full-size image plus its details, shown above the gallery
#[derive(Debug, Clone, PartialEq)]
pub struct FocusOverlay {
    pub src: String,
    pub metadata: ImageMetadata,
}

impl FocusOverlay {
    pub fn details(&self) -> Vec<(&'static str, String)> {
        self.metadata.detail_lines()
    }
}

/// Metadata for the focus overlay
pub async fn load_focus_metadata(client: ApiClient, filename: String) -> std::result::Result<ImageMetadata, String> {
    client
        .fetch_metadata(&filename)
        .await
        .map_err(|e| format!("Failed to fetch metadata for {}: {}", filename, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leftover_parts(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".part"))
            .count()
    }

    fn staged(dir: &Path, bytes: &[u8]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".part").tempfile_in(dir).unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=cat.png")),
            "cat.png"
        );
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=\"cat 2.png\"; size=10")),
            "cat 2.png"
        );
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=../../etc/passwd")),
            "passwd"
        );
        assert_eq!(filename_from_disposition(Some("inline")), FALLBACK_FILENAME);
        assert_eq!(filename_from_disposition(Some("attachment; filename=")), FALLBACK_FILENAME);
        assert_eq!(filename_from_disposition(None), FALLBACK_FILENAME);
    }

    #[test]
    fn test_save_without_header_uses_fallback_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let fetched = FetchedImage {
            bytes: vec![1, 2, 3],
            content_disposition: None,
        };

        let saved = save_download(dir.path(), &fetched).unwrap();
        assert_eq!(saved, dir.path().join(FALLBACK_FILENAME));
        assert_eq!(fs::read(&saved).unwrap(), vec![1, 2, 3]);
        assert_eq!(leftover_parts(dir.path()), 0);
    }

    #[test]
    fn test_save_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let fetched = FetchedImage {
            bytes: vec![9],
            content_disposition: Some("attachment; filename=cat.png".to_string()),
        };

        let first = save_download(dir.path(), &fetched).unwrap();
        let second = save_download(dir.path(), &fetched).unwrap();
        let third = save_download(dir.path(), &fetched).unwrap();

        assert_eq!(first, dir.path().join("cat.png"));
        assert_eq!(second, dir.path().join("cat (1).png"));
        assert_eq!(third, dir.path().join("cat (2).png"));
        assert_eq!(leftover_parts(dir.path()), 0);
    }

    #[test]
    fn test_file_created_after_staging_is_kept() {
        let dir = TempDir::new().unwrap();
        let download = staged(dir.path(), b"new download");

        // Appears between staging and persisting
        fs::write(dir.path().join("cat.png"), b"existing file").unwrap();

        let saved = persist_unique(download, dir.path(), "cat.png").unwrap();
        assert_eq!(saved, dir.path().join("cat (1).png"));
        assert_eq!(fs::read(dir.path().join("cat.png")).unwrap(), b"existing file");
        assert_eq!(fs::read(&saved).unwrap(), b"new download");
        assert_eq!(leftover_parts(dir.path()), 0);
    }

    #[test]
    fn test_failed_persist_removes_staging_file() {
        let dir = TempDir::new().unwrap();
        let download = staged(dir.path(), b"abc");
        let staging_path = download.path().to_path_buf();
        assert!(staging_path.exists());

        // Destination directory does not exist
        let result = persist_unique(download, &dir.path().join("missing/sub"), "cat.png");
        assert!(result.is_err());
        assert!(!staging_path.exists());
    }

    #[test]
    fn test_candidate_names() {
        let names: Vec<String> = candidate_names("README").take(3).collect();
        assert_eq!(names, vec!["README", "README (1)", "README (2)"]);

        let names: Vec<String> = candidate_names("cat.tar.gz").take(2).collect();
        assert_eq!(names, vec!["cat.tar.gz", "cat.tar (1).gz"]);
    }
}

use super::ImageStore;
use crate::ai::mime::extension_for_mime;
use crate::models::GeneratedImage;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Writes images into one output directory as
/// `<slug>_<YYYYmmdd_HHMMSS>.<ext>`.
pub struct FileImageStore {
    output_dir: PathBuf,
}

impl FileImageStore {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn file_name_for<Tz: TimeZone>(
        subject: &str,
        mime_type: &str,
        timestamp: &DateTime<Tz>,
    ) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        format!(
            "{}_{}.{}",
            slugify(subject),
            timestamp.format("%Y%m%d_%H%M%S"),
            extension_for_mime(mime_type)
        )
    }

    /// Create the first free variant of `file_name` (`name.ext`, `name_2.ext`,
    /// ...). Creation is exclusive, so concurrent saves never share a file.
    async fn create_unique(&self, file_name: &str) -> Result<(PathBuf, File)> {
        let (stem, ext) = file_name.rsplit_once('.').unwrap_or((file_name, ""));

        for n in 1u32.. {
            let candidate = if n == 1 {
                self.output_dir.join(file_name)
            } else {
                self.output_dir.join(format!("{}_{}.{}", stem, n, ext))
            };

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(file) => return Ok((candidate, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(Error::Invariant(format!("No free file name for {}", file_name)))
    }
}

#[async_trait]
impl ImageStore for FileImageStore {
    async fn save(&self, subject: &str, image: &GeneratedImage) -> Result<PathBuf> {
        if image.data.is_empty() {
            return Err(Error::Invariant("Refusing to save an empty image".to_string()));
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;

        let file_name = Self::file_name_for(subject, &image.mime_type, &Local::now());
        let (path, mut file) = self.create_unique(&file_name).await?;
        file.write_all(&image.data).await?;
        file.flush().await?;

        tracing::info!("Saved image ({} bytes) to {}", image.data.len(), path.display());
        Ok(path)
    }
}

/// Lowercased alphanumerics (any script), every other run of characters
/// collapsed into one underscore.
fn slugify(subject: &str) -> String {
    let mut slug = String::with_capacity(subject.len());
    for c in subject.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }

    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "image".to_string()
    } else {
        slug.to_string()
    }
}

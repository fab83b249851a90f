use crate::mailer::FileAttachment;

use axum::extract::multipart::{Field, MultipartError};
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

use std::{
    io,
    path::{Path, PathBuf},
};

// Upper bound on disambiguated names tried for one millisecond.
const MAX_RESERVE_ATTEMPTS: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Failed to store uploaded file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read uploaded file: {0}")]
    Multipart(#[from] MultipartError),
}

/// Directory holding résumé uploads while their request is in flight.
#[derive(Debug, Clone)]
pub struct StagingDir {
    root: PathBuf,
}

impl StagingDir {
    pub async fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Streams a multipart file field to disk under a fresh unique name.
    pub async fn stage(
        &self,
        original_name: &str,
        mut field: Field<'_>,
    ) -> Result<StagedFile, StagingError> {
        let (staged, mut file) = self.reserve(original_name).await?;

        let mut size = 0;
        while let Some(chunk) = field.chunk().await? {
            size += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        tracing::info!(
            "Staged upload '{}' as '{}' ({} bytes)",
            staged.original_name,
            staged.storage_name,
            size
        );
        Ok(staged)
    }

    async fn reserve(&self, original_name: &str) -> io::Result<(StagedFile, tokio::fs::File)> {
        self.reserve_at(chrono::Utc::now().timestamp_millis(), original_name)
            .await
    }

    /// Creates the staged file with create-new semantics so two uploads
    /// sharing a millisecond and a filename never land on the same path.
    async fn reserve_at(
        &self,
        millis: i64,
        original_name: &str,
    ) -> io::Result<(StagedFile, tokio::fs::File)> {
        let display_name = base_name(original_name);

        for attempt in 0..MAX_RESERVE_ATTEMPTS {
            let storage_name = storage_name(millis, display_name, attempt);
            let path = self.root.join(&storage_name);

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    let staged = StagedFile {
                        original_name: display_name.to_string(),
                        storage_name,
                        path,
                        removed: false,
                    };
                    return Ok((staged, file));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free storage name for upload '{display_name}'"),
        ))
    }
}

/// An uploaded file living in the staging directory. The file is removed by
/// [`StagedFile::discard`], or on drop if that never ran.
#[derive(Debug)]
pub struct StagedFile {
    original_name: String,
    storage_name: String,
    path: PathBuf,
    removed: bool,
}

impl StagedFile {
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn attachment(&self) -> FileAttachment {
        FileAttachment {
            filename: self.original_name.clone(),
            path: self.path.clone(),
        }
    }

    /// Removes the file. Failures are logged and otherwise ignored.
    pub async fn discard(mut self) {
        self.removed = true;
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            tracing::warn!(
                "Failed to remove staged upload {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove staged upload {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

fn base_name(original_name: &str) -> &str {
    original_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or("upload")
}

fn storage_name(millis: i64, name: &str, attempt: u32) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                normalized.push('-');
            }
            in_whitespace = true;
        } else {
            normalized.push(c);
            in_whitespace = false;
        }
    }

    if attempt == 0 {
        format!("{millis}-{normalized}")
    } else {
        format!("{millis}-{attempt}-{normalized}")
    }
}

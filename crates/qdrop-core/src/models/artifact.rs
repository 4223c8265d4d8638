//! The binary package selected for upload

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tokio_util::io::ReaderStream;

use crate::constants::{APK_CONTENT_TYPE, DEFAULT_CONTENT_TYPE};

/// Read size used when streaming artifact bytes.
const CHUNK_SIZE: usize = 64 * 1024;

/// Stream of artifact chunks handed to a transfer backend.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Where the artifact bytes live
#[derive(Debug, Clone)]
pub enum ArtifactSource {
    /// A file on local disk, streamed on demand
    Path(PathBuf),
    /// Bytes already in memory
    Memory(Bytes),
}

/// An artifact chosen by the user: descriptive metadata plus a way to read its bytes.
#[derive(Debug, Clone)]
pub struct ArtifactFile {
    pub name: String,
    pub content_type: String,
    pub size: u64,
    source: ArtifactSource,
}

impl ArtifactFile {
    /// Describe a file on disk. Size is taken from the file's metadata.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Invalid file name: {}", path.display()),
                )
            })?;

        Ok(Self {
            content_type: content_type_for(&name).to_string(),
            name,
            size: metadata.len(),
            source: ArtifactSource::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let data = data.into();
        Self {
            content_type: content_type_for(&name).to_string(),
            name,
            size: data.len() as u64,
            source: ArtifactSource::Memory(data),
        }
    }

    /// Override the content type inferred from the file name.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn source(&self) -> &ArtifactSource {
        &self.source
    }

    /// Lowercased extension without the leading dot, if the name has one.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    /// Open the artifact as a stream of chunks.
    pub async fn byte_stream(&self) -> io::Result<ByteStream> {
        match &self.source {
            ArtifactSource::Path(path) => {
                let file = tokio::fs::File::open(path).await?;
                Ok(ReaderStream::with_capacity(file, CHUNK_SIZE).boxed())
            }
            ArtifactSource::Memory(data) => {
                let data = data.clone();
                let chunks: Vec<io::Result<Bytes>> = (0..data.len())
                    .step_by(CHUNK_SIZE)
                    .map(|start| Ok(data.slice(start..(start + CHUNK_SIZE).min(data.len()))))
                    .collect();
                Ok(stream::iter(chunks).boxed())
            }
        }
    }

    /// Read the whole artifact into memory.
    pub async fn read_all(&self) -> io::Result<Bytes> {
        match &self.source {
            ArtifactSource::Path(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
            ArtifactSource::Memory(data) => Ok(data.clone()),
        }
    }
}

/// Content type for a file name, based on its extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    if file_name.to_lowercase().ends_with(".apk") {
        APK_CONTENT_TYPE
    } else {
        DEFAULT_CONTENT_TYPE
    }
}

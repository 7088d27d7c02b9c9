use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::filename::{extension_of, validate_attachment_name};

use crate::error::DraftError;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "webm", "mkv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac", "m4a"];

/// Media category derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Audio,
    Video,
    Other,
}

impl FileCategory {
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Audio
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Other => "other",
        }
    }
}

/// Which of the two attachment sets a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// Input files handed to the solver, packaged under `data/`.
    Reference,
    /// Expected outputs, packaged under `solution/`.
    Solution,
}

impl AttachmentKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Reference => "data",
            Self::Solution => "solution",
        }
    }
}

#[derive(Debug, Clone)]
pub enum AttachmentSource {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

/// An uploaded file: declared name, byte size and where its bytes live.
#[derive(Debug, Clone)]
pub struct Attachment {
    name: String,
    size: u64,
    source: AttachmentSource,
}

impl Attachment {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            source: AttachmentSource::Memory(Arc::from(bytes)),
        }
    }

    /// Reference a file on disk, named after its final path component.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no usable file name", path.display()),
                )
            })?
            .to_string();
        let meta = tokio::fs::metadata(path).await?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        Ok(Self {
            name,
            size: meta.len(),
            source: AttachmentSource::Path(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }

    pub fn category(&self) -> FileCategory {
        FileCategory::from_extension(&self.extension())
    }

    pub fn source(&self) -> &AttachmentSource {
        &self.source
    }

    /// Load the full contents into memory.
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        match &self.source {
            AttachmentSource::Path(path) => tokio::fs::read(path).await,
            AttachmentSource::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// An ordered attachment collection with unique names.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSet {
    files: Vec<Attachment>,
}

impl AttachmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file. A name already present is rejected, never replaced.
    pub fn add(&mut self, mut attachment: Attachment) -> Result<(), DraftError> {
        let name = validate_attachment_name(&attachment.name)
            .map_err(|reason| DraftError::InvalidAttachmentName {
                name: attachment.name.clone(),
                reason,
            })?
            .to_string();

        if self.contains(&name) {
            return Err(DraftError::DuplicateAttachment(name));
        }

        attachment.name = name;
        self.files.push(attachment);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Attachment, DraftError> {
        let index = self
            .files
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| DraftError::UnknownAttachment(name.to_string()))?;
        Ok(self.files.remove(index))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attachment> {
        self.files.iter()
    }

    pub fn as_slice(&self) -> &[Attachment] {
        &self.files
    }

    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}

impl<'a> IntoIterator for &'a AttachmentSet {
    type Item = &'a Attachment;
    type IntoIter = std::slice::Iter<'a, Attachment>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

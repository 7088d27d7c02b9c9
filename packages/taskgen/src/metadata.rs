//! Per-file metadata for the `metadata.json` side-cars.
//!
//! Every attachment gets name, size and extension. Images additionally get
//! pixel dimensions, audio a duration and video both. Decoding never fails the
//! caller: anything that cannot be read or recognized falls back to the base
//! fields.

use std::io::Cursor;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use common::FileMetadata;
use common::config::ProbeConfig;
use futures::future::join_all;
use serde::Deserialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::attachment::{Attachment, AttachmentSource, FileCategory};

/// Raw facts reported by a decoder, before category-specific shaping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("wav decode failed: {0}")]
    Wav(#[from] hound::Error),
    #[error("ffprobe failed: {0}")]
    Ffprobe(String),
    #[error("no decoder for .{0} files")]
    Unsupported(String),
}

/// Extracts media facts from one attachment.
#[async_trait]
pub trait MediaDecoder: Send + Sync {
    async fn decode(
        &self,
        attachment: &Attachment,
        category: FileCategory,
    ) -> Result<MediaInfo, ProbeError>;
}

/// Images through the `image` crate, WAV through `hound`, everything else
/// with audio or video content through `ffprobe`.
pub struct NativeDecoder {
    ffprobe_bin: String,
}

impl NativeDecoder {
    pub fn new(ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffprobe_bin: ffprobe_bin.into(),
        }
    }
}

#[async_trait]
impl MediaDecoder for NativeDecoder {
    async fn decode(
        &self,
        attachment: &Attachment,
        category: FileCategory,
    ) -> Result<MediaInfo, ProbeError> {
        let extension = attachment.extension();
        match category {
            FileCategory::Image if extension == "svg" => Err(ProbeError::Unsupported(extension)),
            FileCategory::Image => {
                let bytes = attachment.read().await?;
                let (width, height) = image_dimensions(&bytes)?;
                Ok(MediaInfo {
                    width: Some(width),
                    height: Some(height),
                    duration_seconds: None,
                })
            }
            FileCategory::Audio if extension == "wav" => {
                let bytes = attachment.read().await?;
                Ok(MediaInfo {
                    duration_seconds: Some(wav_duration(&bytes)?),
                    ..MediaInfo::default()
                })
            }
            FileCategory::Audio | FileCategory::Video => {
                ffprobe(&self.ffprobe_bin, attachment).await
            }
            FileCategory::Other => Err(ProbeError::Unsupported(extension)),
        }
    }
}

/// Header-only decode of the natural pixel size.
fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), ProbeError> {
    let reader = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}

fn wav_duration(bytes: &[u8]) -> Result<f64, ProbeError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    let rate = reader.spec().sample_rate;
    if rate == 0 {
        return Ok(0.0);
    }
    Ok(f64::from(reader.duration()) / f64::from(rate))
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

fn parse_ffprobe(stdout: &[u8]) -> Result<MediaInfo, ProbeError> {
    let output: FfprobeOutput =
        serde_json::from_slice(stdout).map_err(|e| ProbeError::Ffprobe(e.to_string()))?;

    let video = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    let duration = output
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or_else(|| output.streams.iter().find_map(|s| s.duration.as_deref()))
        .and_then(|d| d.trim().parse::<f64>().ok());

    Ok(MediaInfo {
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
        duration_seconds: duration,
    })
}

async fn ffprobe(bin: &str, attachment: &Attachment) -> Result<MediaInfo, ProbeError> {
    let mut command = Command::new(bin);
    command.args([
        "-v",
        "error",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
    ]);
    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match attachment.source() {
        AttachmentSource::Path(path) => {
            command.arg(path).stdin(Stdio::null());
            command.output().await?
        }
        AttachmentSource::Memory(bytes) => {
            command.arg("-").stdin(Stdio::piped());
            let mut child = command.spawn()?;
            if let Some(mut stdin) = child.stdin.take() {
                // ffprobe may stop reading once it has the header.
                let _ = stdin.write_all(bytes).await;
                drop(stdin);
            }
            child.wait_with_output().await?
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeError::Ffprobe(format!(
            "exit status {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    parse_ffprobe(&output.stdout)
}

/// `H:MM:SS`, or `M:SS` when the hours component is zero. Zero, negative and
/// non-finite inputs render as `0:00`.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Shapes decoder output into the fields a category is allowed to carry.
fn apply(meta: &mut FileMetadata, category: FileCategory, info: MediaInfo) {
    let with_dims = matches!(category, FileCategory::Image | FileCategory::Video);
    let with_duration = matches!(category, FileCategory::Audio | FileCategory::Video);

    if with_dims {
        if let (Some(w), Some(h)) = (info.width, info.height) {
            meta.width = Some(w);
            meta.height = Some(h);
            meta.resolution = Some(format!("{w}x{h}"));
        }
    }
    if with_duration {
        if let Some(d) = info.duration_seconds {
            let d = if d.is_finite() { d.max(0.0) } else { 0.0 };
            meta.duration_seconds = Some(round2(d));
            meta.duration_formatted = Some(format_duration(d));
        }
    }
}

/// Fans metadata extraction out over a list of attachments.
#[derive(Clone)]
pub struct MetadataProber {
    decoder: Option<Arc<dyn MediaDecoder>>,
}

impl MetadataProber {
    pub fn new(config: &ProbeConfig) -> Self {
        if config.enabled {
            Self::with_decoder(NativeDecoder::new(&config.ffprobe_bin))
        } else {
            Self::disabled()
        }
    }

    pub fn with_decoder(decoder: impl MediaDecoder + 'static) -> Self {
        Self {
            decoder: Some(Arc::new(decoder)),
        }
    }

    /// Base fields only, no decoding.
    pub fn disabled() -> Self {
        Self { decoder: None }
    }

    pub async fn probe(&self, attachment: &Attachment) -> FileMetadata {
        let mut meta =
            FileMetadata::base(attachment.name(), attachment.size(), attachment.extension());
        let category = attachment.category();
        let Some(decoder) = &self.decoder else {
            return meta;
        };
        if category == FileCategory::Other {
            return meta;
        }

        match decoder.decode(attachment, category).await {
            Ok(info) => apply(&mut meta, category, info),
            Err(e) => {
                debug!(
                    file = attachment.name(),
                    category = category.as_str(),
                    error = %e,
                    "Media probe failed, keeping base metadata"
                );
            }
        }
        meta
    }

    /// Probe every file concurrently; the result is in input order.
    pub async fn probe_all(&self, files: &[Attachment]) -> Vec<FileMetadata> {
        join_all(files.iter().map(|f| self.probe(f))).await
    }
}

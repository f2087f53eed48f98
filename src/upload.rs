//! Multipart file uploads with progress reporting.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use reqwest::multipart::{Form, Part};

use crate::errors::Error;

const CHUNK_SIZE: usize = 64 * 1024;

/// Receives the upload percentage, 0 through 100.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// A file to send as the `field` part of a multipart body.
#[derive(Clone, Debug)]
pub struct FileUpload {
    pub field: String,
    pub file_name: String,
    pub mime: Option<String>,
    bytes: Arc<Vec<u8>>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            field: "file".to_string(),
            file_name: file_name.into(),
            mime: None,
            bytes: Arc::new(bytes.into()),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Turns bytes-sent counts into whole percentages and reports each value once.
pub(crate) struct ProgressTracker {
    total: u64,
    sent: AtomicU64,
    last: AtomicU8,
    on_progress: Option<ProgressFn>,
}

impl ProgressTracker {
    pub(crate) fn new(total: u64, on_progress: Option<ProgressFn>) -> Self {
        Self {
            total,
            sent: AtomicU64::new(0),
            // u8::MAX: nothing reported yet
            last: AtomicU8::new(u8::MAX),
            on_progress,
        }
    }

    pub(crate) fn advance(&self, bytes: u64) {
        let Some(on_progress) = self.on_progress.as_ref() else {
            return;
        };
        if self.total == 0 {
            return;
        }
        let sent = self.sent.fetch_add(bytes, Ordering::SeqCst) + bytes;
        let percent = ((sent.min(self.total) as f64 / self.total as f64) * 100.0).round() as u8;
        if self.last.swap(percent, Ordering::SeqCst) != percent {
            on_progress(percent);
        }
    }
}

/// Builds a single-part form that streams `file` and reports progress as chunks are
/// pulled by the transport.
pub(crate) fn multipart_form(
    file: &FileUpload,
    on_progress: Option<ProgressFn>,
) -> Result<Form, Error> {
    let total = file.len() as u64;
    let tracker = Arc::new(ProgressTracker::new(total, on_progress));
    let bytes = Arc::clone(&file.bytes);
    let chunks = (0..file.len()).step_by(CHUNK_SIZE).map(move |start| {
        let end = (start + CHUNK_SIZE).min(bytes.len());
        let chunk = bytes[start..end].to_vec();
        tracker.advance(chunk.len() as u64);
        Ok::<_, std::io::Error>(chunk)
    });
    let body = reqwest::Body::wrap_stream(futures::stream::iter(chunks));

    let mut part = Part::stream_with_length(body, total).file_name(file.file_name.clone());
    if let Some(mime) = file.mime.as_deref() {
        part = part
            .mime_str(mime)
            .map_err(|e| Error::Config(format!("invalid MIME type {mime:?}: {e}")))?;
    }
    Ok(Form::new().part(file.field.clone(), part))
}

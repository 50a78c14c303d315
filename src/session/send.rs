//! Outbound message types and attachment resolution.

use std::path::PathBuf;

use bytes::Bytes;

use crate::automation::Media;
use crate::error::AttachmentError;
use crate::Result;

/// Body used when the caller does not supply one.
pub const DEFAULT_BODY: &str = "Your Report";
/// Filename used when neither the caller nor the path supplies one.
pub const DEFAULT_FILENAME: &str = "file.pdf";
/// Declared media type for raw byte attachments.
pub const DEFAULT_MIME: &str = "application/pdf";

/// Attachment input: raw bytes or a filesystem path read at send time.
#[derive(Clone, Debug)]
pub enum Attachment {
    Bytes(Bytes),
    Path(PathBuf),
}

/// One outbound message; constructed per call, not persisted.
#[derive(Clone, Debug)]
pub struct OutboundMessage {
    pub phone: String,
    pub body: String,
    pub attachment: Option<Attachment>,
    pub filename: Option<String>,
}

impl OutboundMessage {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            body: DEFAULT_BODY.to_string(),
            attachment: None,
            filename: None,
        }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn attach_bytes(mut self, data: impl Into<Bytes>) -> Self {
        self.attachment = Some(Attachment::Bytes(data.into()));
        self
    }

    pub fn attach_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachment = Some(Attachment::Path(path.into()));
        self
    }

    pub fn filename(mut self, name: impl Into<String>) -> Self {
        self.filename = Some(name.into());
        self
    }
}

/// Resolve an attachment into transport media.
///
/// Raw bytes get the fixed pdf media type and the given/default filename. A
/// path is read here; its media type derives from the extension and the
/// filename from the last path segment when none was given.
pub async fn resolve_media(
    attachment: &Attachment,
    filename: Option<&str>,
) -> Result<Media> {
    match attachment {
        Attachment::Bytes(data) => Ok(Media {
            mime: DEFAULT_MIME.to_string(),
            data: data.clone(),
            filename: filename.unwrap_or(DEFAULT_FILENAME).to_string(),
        }),
        Attachment::Path(path) => {
            let data = tokio::fs::read(path)
                .await
                .map_err(|source| AttachmentError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("pdf");
            let filename = filename
                .map(str::to_string)
                .or_else(|| {
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
            Ok(Media {
                mime: format!("application/{extension}"),
                data: Bytes::from(data),
                filename,
            })
        }
    }
}

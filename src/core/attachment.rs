use std::io;
use std::path::Path;

use super::message::{FILE_PLACEHOLDER, IMAGE_PLACEHOLDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Image,
    Document,
}

impl AttachmentKind {
    /// Transcript text used when the attachment is sent without a message.
    pub fn placeholder(self) -> &'static str {
        match self {
            AttachmentKind::Image => IMAGE_PLACEHOLDER,
            AttachmentKind::Document => FILE_PLACEHOLDER,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Document => "file",
        }
    }
}

/// A file queued in the composer, read fully into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(kind: AttachmentKind, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_for(&file_name, kind).to_string();
        Self {
            kind,
            file_name,
            mime,
            bytes,
        }
    }

    pub fn image(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(AttachmentKind::Image, file_name, bytes)
    }

    pub fn document(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(AttachmentKind::Document, file_name, bytes)
    }

    pub async fn load(kind: AttachmentKind, path: &Path) -> io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} does not name a file", path.display()),
                )
            })?;
        Ok(Self::new(kind, file_name, bytes))
    }
}

fn mime_for(file_name: &str, kind: AttachmentKind) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        _ => match kind {
            AttachmentKind::Image => "application/octet-stream",
            AttachmentKind::Document => "text/plain",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn mime_follows_extension_case_insensitively() {
        assert_eq!(Attachment::image("CAT.JPG", vec![]).mime, "image/jpeg");
        assert_eq!(Attachment::document("notes.md", vec![]).mime, "text/markdown");
    }

    #[test]
    fn unknown_extensions_fall_back_per_kind() {
        assert_eq!(
            Attachment::image("blob", vec![]).mime,
            "application/octet-stream"
        );
        assert_eq!(Attachment::document("README", vec![]).mime, "text/plain");
    }

    #[tokio::test]
    async fn load_reads_bytes_and_file_name() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(b"hello").expect("write");

        let attachment = Attachment::load(AttachmentKind::Document, file.path())
            .await
            .expect("load");
        assert_eq!(attachment.bytes, b"hello");
        assert_eq!(attachment.kind, AttachmentKind::Document);
        assert!(!attachment.file_name.is_empty());
    }

    #[tokio::test]
    async fn load_reports_missing_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("nope.png");
        assert!(Attachment::load(AttachmentKind::Image, &missing).await.is_err());
    }
}

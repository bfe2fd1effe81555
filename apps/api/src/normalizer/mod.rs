//! Content normalizer: turns an uploaded résumé file into a uniform `SourcePayload`.
//!
//! Routing is decided by the declared media type only; bytes are never sniffed.
//! - `application/pdf`, `image/*` → base64 `Inline` payload (the model does its own OCR)
//! - DOCX → external text extractor → `PlainText`
//! - anything else → decoded as UTF-8 text → `PlainText`

use std::path::PathBuf;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

pub mod docx;

pub use docx::{DocumentTextExtractor, DocxTextExtractor};

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The document content handed to the extraction pipeline.
/// Lives for a single analysis request and is never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePayload {
    /// Base64-encoded binary document or image, sent to the model as-is.
    Inline { data: String, mime_type: String },
    /// Text already extracted locally.
    PlainText { content: String },
}

impl SourcePayload {
    /// True when the payload carries neither bytes nor text.
    pub fn is_empty(&self) -> bool {
        match self {
            SourcePayload::Inline { data, .. } => data.is_empty(),
            SourcePayload::PlainText { content } => content.trim().is_empty(),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SourcePayload::Inline { .. } => "inline",
            SourcePayload::PlainText { .. } => "plain_text",
        }
    }
}

/// Where the uploaded bytes live.
#[derive(Debug, Clone)]
pub enum FileSource {
    Memory(Bytes),
    Path(PathBuf),
}

/// A file as received from the caller.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub source: FileSource,
}

impl UploadedFile {
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: FileSource::Memory(data),
        }
    }

    pub fn from_path(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: FileSource::Path(path.into()),
        }
    }
}

/// Normalizer output. `file_name` is display metadata only and is not part of the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub file_name: String,
    pub payload: SourcePayload,
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Unreadable file '{file_name}': {detail}")]
    UnreadableFile { file_name: String, detail: String },
}

impl NormalizeError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NormalizeError::UnreadableFile { .. } => {
                "The uploaded file could not be read. Please choose the file again or try another format."
            }
        }
    }
}

/// How a declared media type is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaClass {
    Inline,
    WordProcessing,
    Text,
}

fn classify(mime_type: &str) -> MediaClass {
    let essence = mime_essence(mime_type);
    if essence == PDF_MIME || essence.starts_with("image/") {
        MediaClass::Inline
    } else if essence == DOCX_MIME {
        MediaClass::WordProcessing
    } else {
        MediaClass::Text
    }
}

/// Lowercased media type with any parameters removed.
fn mime_essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub struct Normalizer {
    text_extractor: Arc<dyn DocumentTextExtractor>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Arc::new(DocxTextExtractor::default()))
    }
}

impl Normalizer {
    pub fn new(text_extractor: Arc<dyn DocumentTextExtractor>) -> Self {
        Self { text_extractor }
    }

    /// Reads the file and produces its payload. Failures are reported, never retried.
    pub async fn normalize(&self, file: UploadedFile) -> Result<NormalizedDocument, NormalizeError> {
        let unreadable = |detail: String| NormalizeError::UnreadableFile {
            file_name: file.name.clone(),
            detail,
        };

        let data = match &file.source {
            FileSource::Memory(bytes) => bytes.clone(),
            FileSource::Path(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| unreadable(e.to_string()))?,
        };

        let class = classify(&file.mime_type);
        debug!(file_name = %file.name, mime_type = %file.mime_type, ?class, "Normalizing upload");

        // Inflating, parsing and base64 encoding are CPU-bound.
        let extractor = Arc::clone(&self.text_extractor);
        let mime_type = file.mime_type.clone();
        let payload = tokio::task::spawn_blocking(move || {
            build_payload(class, &mime_type, &data, extractor.as_ref())
        })
        .await
        .map_err(|e| unreadable(format!("normalization task failed: {e}")))?
        .map_err(|e| {
            warn!(file_name = %file.name, "Word document text extraction failed: {e:#}");
            unreadable(format!("{e:#}"))
        })?;

        Ok(NormalizedDocument {
            file_name: file.name,
            payload,
        })
    }
}

fn build_payload(
    class: MediaClass,
    mime_type: &str,
    data: &[u8],
    extractor: &dyn DocumentTextExtractor,
) -> anyhow::Result<SourcePayload> {
    Ok(match class {
        MediaClass::Inline => SourcePayload::Inline {
            data: STANDARD.encode(data),
            mime_type: mime_essence(mime_type),
        },
        MediaClass::WordProcessing => SourcePayload::PlainText {
            content: extractor.extract_text(data)?,
        },
        MediaClass::Text => SourcePayload::PlainText {
            content: String::from_utf8_lossy(data).into_owned(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Extractor double that returns fixed text and counts invocations.
    struct FixedExtractor {
        text: &'static str,
        calls: AtomicUsize,
    }

    impl FixedExtractor {
        fn new(text: &'static str) -> Arc<Self> {
            Arc::new(Self {
                text,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl DocumentTextExtractor for FixedExtractor {
        fn extract_text(&self, _data: &[u8]) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.to_string())
        }
    }

    struct FailingExtractor;

    impl DocumentTextExtractor for FailingExtractor {
        fn extract_text(&self, _data: &[u8]) -> anyhow::Result<String> {
            anyhow::bail!("corrupt archive")
        }
    }

    #[tokio::test]
    async fn test_png_becomes_inline_base64_without_text_extraction() {
        let extractor = FixedExtractor::new("should not be used");
        let normalizer = Normalizer::new(extractor.clone());
        let file = UploadedFile::from_bytes("photo.png", "image/png", Bytes::from_static(b"\x89PNG"));

        let doc = normalizer.normalize(file).await.unwrap();

        assert_eq!(
            doc.payload,
            SourcePayload::Inline {
                data: STANDARD.encode(b"\x89PNG"),
                mime_type: "image/png".to_string(),
            }
        );
        assert_eq!(doc.file_name, "photo.png");
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pdf_becomes_inline() {
        let normalizer = Normalizer::default();
        let file = UploadedFile::from_bytes("cv.pdf", "Application/PDF", Bytes::from_static(b"%PDF-1.7"));

        let doc = normalizer.normalize(file).await.unwrap();
        match doc.payload {
            SourcePayload::Inline { data, mime_type } => {
                assert_eq!(mime_type, "application/pdf");
                assert_eq!(STANDARD.decode(data).unwrap(), b"%PDF-1.7");
            }
            other => panic!("expected inline payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_docx_uses_extractor_output() {
        let extractor = FixedExtractor::new("Jane Doe\nSenior Accountant");
        let normalizer = Normalizer::new(extractor.clone());
        let file = UploadedFile::from_bytes("cv.docx", DOCX_MIME, Bytes::from_static(b"PK"));

        let doc = normalizer.normalize(file).await.unwrap();

        assert_eq!(
            doc.payload,
            SourcePayload::PlainText {
                content: "Jane Doe\nSenior Accountant".to_string()
            }
        );
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_docx_extraction_failure_is_unreadable_file() {
        let normalizer = Normalizer::new(Arc::new(FailingExtractor));
        let file = UploadedFile::from_bytes("broken.docx", DOCX_MIME, Bytes::from_static(b"nope"));

        let err = normalizer.normalize(file).await.unwrap_err();
        let NormalizeError::UnreadableFile { file_name, detail } = err;
        assert_eq!(file_name, "broken.docx");
        assert!(detail.contains("corrupt archive"));
    }

    /// Records which thread ran the extraction.
    struct ThreadRecordingExtractor {
        thread: std::sync::Mutex<Option<std::thread::ThreadId>>,
    }

    impl DocumentTextExtractor for ThreadRecordingExtractor {
        fn extract_text(&self, _data: &[u8]) -> anyhow::Result<String> {
            *self.thread.lock().unwrap() = Some(std::thread::current().id());
            Ok("text".to_string())
        }
    }

    struct PanickingExtractor;

    impl DocumentTextExtractor for PanickingExtractor {
        fn extract_text(&self, _data: &[u8]) -> anyhow::Result<String> {
            panic!("extractor bug")
        }
    }

    #[tokio::test]
    async fn test_docx_extraction_runs_off_the_async_thread() {
        let extractor = Arc::new(ThreadRecordingExtractor {
            thread: std::sync::Mutex::new(None),
        });
        let normalizer = Normalizer::new(extractor.clone());
        let file = UploadedFile::from_bytes("cv.docx", DOCX_MIME, Bytes::from_static(b"PK"));

        normalizer.normalize(file).await.unwrap();

        let worker = extractor.thread.lock().unwrap().expect("extractor was not called");
        assert_ne!(worker, std::thread::current().id());
    }

    #[tokio::test]
    async fn test_extractor_panic_is_unreadable_file() {
        let normalizer = Normalizer::new(Arc::new(PanickingExtractor));
        let file = UploadedFile::from_bytes("cv.docx", DOCX_MIME, Bytes::from_static(b"PK"));

        let err = normalizer.normalize(file).await.unwrap_err();
        match err {
            NormalizeError::UnreadableFile { file_name, detail } => {
                assert_eq!(file_name, "cv.docx");
                assert!(detail.contains("normalization task failed"), "{detail}");
            }
        }
    }

    #[tokio::test]
    async fn test_oversized_docx_body_is_unreadable_file() {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(&vec![b' '; 64 * 1024]).unwrap();
        let data = writer.finish().unwrap().into_inner();

        let normalizer = Normalizer::new(Arc::new(DocxTextExtractor::with_limit(1024)));
        let file = UploadedFile::from_bytes("bomb.docx", DOCX_MIME, Bytes::from(data));

        let err = normalizer.normalize(file).await.unwrap_err();
        assert!(matches!(err, NormalizeError::UnreadableFile { .. }));
    }

    #[tokio::test]
    async fn test_plain_text_and_unknown_types_are_read_as_text() {
        let normalizer = Normalizer::default();
        for mime in ["text/plain; charset=utf-8", "text/markdown", "application/octet-stream", ""] {
            let file = UploadedFile::from_bytes("cv.txt", mime, Bytes::from_static("خبرة ١٠ سنوات".as_bytes()));
            let doc = normalizer.normalize(file).await.unwrap();
            assert_eq!(
                doc.payload,
                SourcePayload::PlainText {
                    content: "خبرة ١٠ سنوات".to_string()
                },
                "mime type {mime:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_reads_from_path() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"Experience: 7 years").unwrap();
        let normalizer = Normalizer::default();

        let doc = normalizer
            .normalize(UploadedFile::from_path("cv.txt", "text/plain", tmp.path()))
            .await
            .unwrap();

        assert_eq!(
            doc.payload,
            SourcePayload::PlainText {
                content: "Experience: 7 years".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_path_is_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let normalizer = Normalizer::default();
        let file = UploadedFile::from_path("gone.pdf", PDF_MIME, dir.path().join("gone.pdf"));

        let err = normalizer.normalize(file).await.unwrap_err();
        assert!(matches!(err, NormalizeError::UnreadableFile { .. }));
        assert!(!err.user_message().is_empty());
    }

    #[test]
    fn test_payload_emptiness() {
        assert!(SourcePayload::PlainText { content: "  \n".into() }.is_empty());
        assert!(SourcePayload::Inline {
            data: String::new(),
            mime_type: "image/png".into()
        }
        .is_empty());
        assert!(!SourcePayload::PlainText { content: "cv".into() }.is_empty());
    }
}

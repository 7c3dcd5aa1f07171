//! Entry sources.
//!
//! An [`EntrySource`] produces the lazy sequence of named byte streams one
//! archive export consumes. The set of origins is closed and dispatched
//! once at request start. Every entry opens a fresh read handle (Local,
//! Remote) or synthesizes a fresh document (Generated); nothing is cached
//! or deduplicated between entries.

use std::path::PathBuf;

use pandora_archive::{ArchiveError, EntryWriter};
use pandora_core::{document_title, entry_name, file_stem, ExportError, ExportResult};
use pandora_pdf::DocumentBuilder;
use pandora_storage::ObjectStore;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::state::AppState;

/// Copy buffer for local file reads.
const COPY_CHUNK: usize = 32 * 1024;

/// The origin of one export's archive entries.
pub enum EntrySource {
    /// Fresh reads of a fixed local file.
    Local {
        /// Path of the source document.
        path: PathBuf,
        /// Cached file stem used in entry names.
        stem: String,
    },
    /// Fresh fetches of a fixed remote object.
    Remote {
        /// Storage handle.
        store: ObjectStore,
        /// Bucket holding the object.
        bucket: String,
        /// Key of the object.
        key: String,
        /// Cached key stem used in entry names.
        stem: String,
    },
    /// Freshly generated one-page documents.
    Generated,
}

impl EntrySource {
    /// Select the source for an archive export.
    #[must_use]
    pub fn local(path: PathBuf) -> Self {
        let stem = file_stem(&path.to_string_lossy());
        Self::Local { path, stem }
    }

    /// Source reading the configured remote object.
    #[must_use]
    pub fn remote(state: &AppState) -> Self {
        let bucket = state.config.export.s3_bucket.clone();
        let key = state.config.export.s3_key.clone();
        let stem = file_stem(&key);
        Self::Remote {
            store: state.store.clone(),
            bucket,
            key,
            stem,
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Remote { .. } => "remote",
            Self::Generated => "generated",
        }
    }

    /// Name of the entry at `index` (1-based).
    #[must_use]
    pub fn entry_name(&self, index: u32) -> String {
        match self {
            Self::Local { stem, .. } | Self::Remote { stem, .. } => entry_name(stem, index),
            Self::Generated => entry_name("dynamic-pdf", index),
        }
    }

    /// Stream the content of entry `index` into an open archive entry.
    pub async fn copy_entry<W: AsyncWrite + Unpin + Send>(
        &self,
        index: u32,
        entry: &mut EntryWriter<'_, W>,
    ) -> ExportResult<()> {
        match self {
            Self::Local { path, .. } => {
                let file = tokio::fs::File::open(path).await.map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        ExportError::not_found(path.to_string_lossy())
                    } else {
                        ExportError::Io(e)
                    }
                })?;
                copy_reader(file, entry).await
            }
            Self::Remote {
                store, bucket, key, ..
            } => {
                let mut body = store.open(bucket, key).await.map_err(|e| {
                    ExportError::remote_unavailable(bucket.as_str(), key.as_str(), e.to_string())
                })?;
                while let Some(chunk) = body.next_chunk().await.map_err(|e| {
                    ExportError::remote_unavailable(bucket.as_str(), key.as_str(), e.to_string())
                })? {
                    entry.write(&chunk).await.map_err(archive_to_export)?;
                }
                Ok(())
            }
            Self::Generated => {
                let mut builder = DocumentBuilder::new();
                builder.add_page(document_title(index));
                let bytes = builder
                    .finish()
                    .map_err(|e| ExportError::document(e.to_string()))?;
                entry.write(&bytes).await.map_err(archive_to_export)
            }
        }
    }
}

/// Chunked copy from an async reader into an open archive entry.
async fn copy_reader<R, W>(mut reader: R, entry: &mut EntryWriter<'_, W>) -> ExportResult<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let mut buf = vec![0u8; COPY_CHUNK];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        entry.write(&buf[..n]).await.map_err(archive_to_export)?;
    }
}

/// Map archive-layer failures onto the service taxonomy.
///
/// Sink I/O errors come from the response pipe, so a broken pipe there is
/// the client going away, not an archive defect.
pub(crate) fn archive_to_export(err: ArchiveError) -> ExportError {
    match err {
        ArchiveError::Io(e) => ExportError::from_sink_io(e),
        other => ExportError::archive(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use pandora_archive::ArchiveWriter;

    #[test]
    fn test_entry_names_per_origin() {
        let local = EntrySource::local(PathBuf::from("Documents/SamplePDF.pdf"));
        assert_eq!(local.entry_name(1), "SamplePDF_0000000001.pdf");

        let generated = EntrySource::Generated;
        assert_eq!(generated.entry_name(3), "dynamic-pdf_0000000003.pdf");
    }

    #[tokio::test]
    async fn test_local_missing_file_is_not_found() {
        let source = EntrySource::local(PathBuf::from("/definitely/not/here.pdf"));
        let mut archive = ArchiveWriter::new(Cursor::new(Vec::new()));
        let mut entry = archive.add_entry("x_0000000001.pdf").await.unwrap();

        let err = source.copy_entry(1, &mut entry).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_local_copies_file_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"sample document bytes").unwrap();

        let source = EntrySource::local(file.path().to_path_buf());
        let mut archive = ArchiveWriter::new(Cursor::new(Vec::new()));
        let mut entry = archive.add_entry(&source.entry_name(1)).await.unwrap();
        source.copy_entry(1, &mut entry).await.unwrap();
        entry.finish().await.unwrap();
        let bytes = archive.finish().await.unwrap().into_inner();

        let mut reader = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = Vec::new();
        std::io::Read::read_to_end(&mut reader.by_index(0).unwrap(), &mut out).unwrap();
        assert_eq!(out, b"sample document bytes");
    }

    #[tokio::test]
    async fn test_generated_entries_are_pdfs() {
        let source = EntrySource::Generated;
        let mut archive = ArchiveWriter::new(Cursor::new(Vec::new()));
        let mut entry = archive.add_entry(&source.entry_name(1)).await.unwrap();
        source.copy_entry(1, &mut entry).await.unwrap();
        entry.finish().await.unwrap();
        let bytes = archive.finish().await.unwrap().into_inner();

        let mut reader = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = Vec::new();
        std::io::Read::read_to_end(&mut reader.by_index(0).unwrap(), &mut out).unwrap();
        assert!(out.starts_with(b"%PDF"));
    }
}

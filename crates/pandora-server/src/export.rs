//! The Export Coordinator.
//!
//! One coordinator run per request: validate the count, set response
//! framing, then drive the entry source into the archive writer (or the
//! document builder) from a spawned task that writes into the response
//! pipe. Validation failures surface as proper HTTP errors; anything that
//! fails after streaming begins is logged and aborts the response, leaving
//! the client a truncated payload without a valid end-of-archive marker.

use std::time::{Duration, Instant};

use http::{header, Response, StatusCode};
use pandora_archive::ArchiveWriter;
use pandora_core::{document_title, ExportError, ExportOrigin, ExportRequest, ExportResult};
use pandora_pdf::DocumentBuilder;
use tokio::io::{AsyncWriteExt, DuplexStream};
use tracing::Instrument;

use crate::body::{full, ResponseBody, StreamingBody};
use crate::source::{archive_to_export, EntrySource};
use crate::state::AppState;

/// Chunk size for draining a finished document into the response pipe.
const DOCUMENT_CHUNK: usize = 16 * 1024;

/// Handle one export request end to end.
///
/// Returns immediately with the streaming response; the export itself runs
/// in a spawned task owning the write half of the response pipe.
pub(crate) async fn handle_export(
    state: AppState,
    origin: ExportOrigin,
    raw_generate: Option<&str>,
) -> Response<ResponseBody> {
    let request = match ExportRequest::parse(origin, raw_generate, state.config.export.max_entries)
    {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(origin = %origin, error = %e, "rejected export request");
            return error_response(&e);
        }
    };

    pandora_telemetry::record_export_started(origin.as_str());

    let (writer, body) = StreamingBody::pipe(state.config.export.stream_buffer_bytes);
    let deadline = state.config.export.timeout();
    let span = tracing::info_span!("export", origin = origin.as_str(), count = request.count);
    tokio::spawn(drive_export(state, request, writer, deadline).instrument(span));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", origin.attachment_filename()),
        )
        .body(body.boxed())
        .unwrap_or_else(|_| Response::new(full("")))
}

/// Render a pre-stream failure as a JSON error response.
pub(crate) fn error_response(err: &ExportError) -> Response<ResponseBody> {
    Response::builder()
        .status(err.status_code())
        .header(header::CONTENT_TYPE, "application/json")
        .body(full(err.to_envelope().to_string()))
        .unwrap_or_else(|_| Response::new(full("")))
}

/// Run the export under its deadline and account for the outcome.
///
/// Dropping the write half on any exit path is what truncates the
/// response; every source handle and the archive session are scoped to
/// the export future, so cancellation releases them with it.
async fn drive_export(
    state: AppState,
    request: ExportRequest,
    sink: DuplexStream,
    deadline: Duration,
) {
    let origin = request.origin;
    let started = Instant::now();
    let outcome = tokio::time::timeout(deadline, run_export(&state, request, sink)).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(produced)) => {
            pandora_telemetry::record_entries_written(origin.as_str(), u64::from(produced));
            tracing::info!(produced, elapsed_ms, "export complete");
        }
        Ok(Err(e)) if e.is_cancellation() => {
            pandora_telemetry::record_export_failed(origin.as_str(), e.code());
            tracing::info!(elapsed_ms, reason = %e, "export cancelled");
        }
        Ok(Err(e)) => {
            pandora_telemetry::record_export_failed(origin.as_str(), e.code());
            tracing::error!(elapsed_ms, error = %e, "export aborted, client receives a truncated payload");
        }
        Err(_) => {
            pandora_telemetry::record_export_failed(origin.as_str(), "DEADLINE");
            tracing::warn!(
                elapsed_ms,
                deadline_secs = deadline.as_secs(),
                "export deadline elapsed, aborting"
            );
        }
    }
}

/// Dispatch on the origin decided at route match.
async fn run_export(
    state: &AppState,
    request: ExportRequest,
    sink: DuplexStream,
) -> ExportResult<u32> {
    match request.origin {
        ExportOrigin::Local => {
            let source = EntrySource::local(state.config.export.local_document_path.clone());
            stream_archive(&source, request.count, sink).await
        }
        ExportOrigin::Remote => {
            stream_archive(&EntrySource::remote(state), request.count, sink).await
        }
        ExportOrigin::Generated => {
            stream_archive(&EntrySource::Generated, request.count, sink).await
        }
        ExportOrigin::GeneratedSingle => stream_document(request.count, sink).await,
    }
}

/// Pull `count` entries from the source and frame them into the archive.
///
/// Entries are produced and written strictly in sequence; the archive sink
/// is a single ordered byte stream. Any entry failure is fatal to the
/// whole export, because earlier bytes are already committed.
async fn stream_archive(
    source: &EntrySource,
    count: u32,
    sink: DuplexStream,
) -> ExportResult<u32> {
    let mut archive = ArchiveWriter::new(sink);

    for index in 1..=count {
        let name = source.entry_name(index);
        let result = async {
            let mut entry = archive.add_entry(&name).await.map_err(archive_to_export)?;
            source.copy_entry(index, &mut entry).await?;
            entry.finish().await.map_err(archive_to_export)
        }
        .await;

        if let Err(e) = result {
            if !e.is_cancellation() {
                tracing::error!(
                    entry = %name,
                    origin = source.label(),
                    error = %e,
                    "entry failed, aborting export"
                );
            }
            return Err(e);
        }
    }

    let mut sink = archive.finish().await.map_err(archive_to_export)?;
    sink.shutdown().await.map_err(ExportError::from_sink_io)?;
    Ok(count)
}

/// Produce one document with `count` pages straight into the pipe.
async fn stream_document(count: u32, mut sink: DuplexStream) -> ExportResult<u32> {
    let mut builder = DocumentBuilder::new();
    for index in 1..=count {
        builder.add_page(document_title(index));
    }
    let bytes = builder
        .finish()
        .map_err(|e| ExportError::document(e.to_string()))?;

    for chunk in bytes.chunks(DOCUMENT_CHUNK) {
        sink.write_all(chunk).await.map_err(ExportError::from_sink_io)?;
    }
    sink.shutdown().await.map_err(ExportError::from_sink_io)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    use http_body_util::BodyExt;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_stream_document_page_count() {
        let (writer, mut reader) = tokio::io::duplex(64 * 1024);

        let producer = tokio::spawn(stream_document(3, writer));
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await.unwrap();
        assert_eq!(producer.await.unwrap().unwrap(), 3);

        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[tokio::test]
    async fn test_stream_archive_generated_entries() {
        let (writer, mut reader) = tokio::io::duplex(64 * 1024);

        let producer = tokio::spawn(async move {
            stream_archive(&EntrySource::Generated, 2, writer).await
        });
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await.unwrap();
        assert_eq!(producer.await.unwrap().unwrap(), 2);

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.by_index(0).unwrap().name(), "dynamic-pdf_0000000001.pdf");
        assert_eq!(archive.by_index(1).unwrap().name(), "dynamic-pdf_0000000002.pdf");
    }

    #[tokio::test]
    async fn test_stream_archive_stops_on_dropped_reader() {
        let (writer, reader) = tokio::io::duplex(64);
        drop(reader);

        let err = stream_archive(&EntrySource::Generated, 50, writer)
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn test_error_response_envelope() {
        let err = ExportError::invalid_request("generate must be positive");
        let response = error_response(&err);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"]["code"], "INVALID_REQUEST");
    }
}

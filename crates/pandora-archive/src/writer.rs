//! Zip container framing over a one-pass sink.
//!
//! Wire layout per entry: local file header with flag bit 3 set (sizes
//! unknown up front), raw-deflate data, then a data descriptor carrying the
//! CRC-32 and both sizes. The central directory and end record trail the
//! last entry. Timestamps are pinned to the DOS epoch so identical inputs
//! produce identical archives.

use std::collections::HashSet;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Result type alias using [`ArchiveError`].
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors raised while framing an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The sink rejected a write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry with the same name was already added.
    #[error("duplicate entry name: {name}")]
    DuplicateEntry {
        /// The offending entry name.
        name: String,
    },

    /// A previous entry was dropped before being finalized; the container
    /// on the wire is unrecoverable.
    #[error("archive session poisoned by an unfinalized entry")]
    Poisoned,

    /// The archive was already finalized.
    #[error("archive already finished")]
    Finished,

    /// An entry or the directory crossed the 4 GiB zip boundary.
    #[error("entry {name} exceeds the 4 GiB zip limit")]
    TooLarge {
        /// The offending entry name.
        name: String,
    },
}

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const DESCRIPTOR_SIG: u32 = 0x0807_4b50;
const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
const END_OF_DIRECTORY_SIG: u32 = 0x0605_4b50;

const VERSION_NEEDED: u16 = 20;
const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;
const METHOD_DEFLATE: u16 = 8;

// 1980-01-01 00:00:00 in DOS date/time encoding; fixed so that identical
// inputs produce identical archives.
const DOS_TIME: u16 = 0;
const DOS_DATE: u16 = 0x0021;

/// Record kept per finished entry for the trailing central directory.
#[derive(Debug)]
struct DirectoryRecord {
    name: String,
    crc: u32,
    compressed: u64,
    uncompressed: u64,
    header_offset: u64,
}

/// Streaming zip writer.
///
/// Entries are written strictly sequentially: [`add_entry`] hands out an
/// [`EntryWriter`] that mutably borrows the archive, so the borrow checker
/// enforces that at most one entry stream is open at a time. Dropping an
/// entry writer without calling [`EntryWriter::finish`] poisons the session
/// and every later operation fails.
///
/// [`add_entry`]: ArchiveWriter::add_entry
#[derive(Debug)]
pub struct ArchiveWriter<W> {
    sink: W,
    offset: u64,
    directory: Vec<DirectoryRecord>,
    names: HashSet<String>,
    poisoned: bool,
    finished: bool,
}

impl<W: AsyncWrite + Unpin + Send> ArchiveWriter<W> {
    /// Create a writer over a sink.
    #[must_use]
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            offset: 0,
            directory: Vec::new(),
            names: HashSet::new(),
            poisoned: false,
            finished: false,
        }
    }

    /// Number of entries finalized so far.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.directory.len()
    }

    /// Open the next entry.
    ///
    /// Writes the entry's local file header immediately. The returned
    /// [`EntryWriter`] must be driven to [`EntryWriter::finish`]; dropping
    /// it early leaves committed bytes on the wire that cannot be framed
    /// into a valid container.
    pub async fn add_entry(&mut self, name: &str) -> ArchiveResult<EntryWriter<'_, W>> {
        self.check_usable()?;
        if !self.names.insert(name.to_string()) {
            return Err(ArchiveError::DuplicateEntry {
                name: name.to_string(),
            });
        }

        let header_offset = self.offset;
        let mut header = BytesMut::with_capacity(30 + name.len());
        header.put_u32_le(LOCAL_HEADER_SIG);
        header.put_u16_le(VERSION_NEEDED);
        header.put_u16_le(FLAG_DATA_DESCRIPTOR);
        header.put_u16_le(METHOD_DEFLATE);
        header.put_u16_le(DOS_TIME);
        header.put_u16_le(DOS_DATE);
        header.put_u32_le(0); // crc, deferred to the descriptor
        header.put_u32_le(0); // compressed size, deferred
        header.put_u32_le(0); // uncompressed size, deferred
        header.put_u16_le(name.len() as u16);
        header.put_u16_le(0); // extra field length
        header.put_slice(name.as_bytes());
        self.put(&header).await?;

        // Pessimistically poisoned until the entry is finalized.
        self.poisoned = true;

        Ok(EntryWriter {
            name: name.to_string(),
            header_offset,
            encoder: DeflateEncoder::new(Vec::new(), Compression::default()),
            crc: Crc::new(),
            uncompressed: 0,
            compressed: 0,
            archive: self,
        })
    }

    /// Finalize the container: central directory plus end record.
    ///
    /// Consumes the writer and returns the sink so the caller can flush or
    /// shut it down.
    pub async fn finish(mut self) -> ArchiveResult<W> {
        self.check_usable()?;
        self.finished = true;

        let directory_offset = self.offset;
        for record in &self.directory {
            let (compressed, uncompressed) = sizes_u32(record)?;
            let header_offset = u32::try_from(record.header_offset).map_err(|_| {
                ArchiveError::TooLarge {
                    name: record.name.clone(),
                }
            })?;

            let mut header = BytesMut::with_capacity(46 + record.name.len());
            header.put_u32_le(CENTRAL_HEADER_SIG);
            header.put_u16_le(VERSION_NEEDED); // version made by
            header.put_u16_le(VERSION_NEEDED);
            header.put_u16_le(FLAG_DATA_DESCRIPTOR);
            header.put_u16_le(METHOD_DEFLATE);
            header.put_u16_le(DOS_TIME);
            header.put_u16_le(DOS_DATE);
            header.put_u32_le(record.crc);
            header.put_u32_le(compressed);
            header.put_u32_le(uncompressed);
            header.put_u16_le(record.name.len() as u16);
            header.put_u16_le(0); // extra field length
            header.put_u16_le(0); // comment length
            header.put_u16_le(0); // disk number start
            header.put_u16_le(0); // internal attributes
            header.put_u32_le(0); // external attributes
            header.put_u32_le(header_offset);
            header.put_slice(record.name.as_bytes());
            self.sink.write_all(&header).await?;
            self.offset += header.len() as u64;
        }

        let directory_size = self.offset - directory_offset;
        let entry_count = self.directory.len() as u16;
        let directory_offset =
            u32::try_from(directory_offset).map_err(|_| ArchiveError::TooLarge {
                name: "<central directory>".to_string(),
            })?;

        let mut end = BytesMut::with_capacity(22);
        end.put_u32_le(END_OF_DIRECTORY_SIG);
        end.put_u16_le(0); // this disk
        end.put_u16_le(0); // directory disk
        end.put_u16_le(entry_count);
        end.put_u16_le(entry_count);
        end.put_u32_le(directory_size as u32);
        end.put_u32_le(directory_offset);
        end.put_u16_le(0); // comment length
        self.sink.write_all(&end).await?;
        self.sink.flush().await?;

        Ok(self.sink)
    }

    fn check_usable(&self) -> ArchiveResult<()> {
        if self.finished {
            return Err(ArchiveError::Finished);
        }
        if self.poisoned {
            return Err(ArchiveError::Poisoned);
        }
        Ok(())
    }

    async fn put(&mut self, data: &[u8]) -> ArchiveResult<()> {
        self.sink.write_all(data).await?;
        self.offset += data.len() as u64;
        Ok(())
    }
}

fn sizes_u32(record: &DirectoryRecord) -> ArchiveResult<(u32, u32)> {
    let compressed = u32::try_from(record.compressed);
    let uncompressed = u32::try_from(record.uncompressed);
    match (compressed, uncompressed) {
        (Ok(c), Ok(u)) => Ok((c, u)),
        _ => Err(ArchiveError::TooLarge {
            name: record.name.clone(),
        }),
    }
}

/// Write handle for a single open entry.
///
/// Bytes passed to [`write`] are deflated and streamed to the archive sink
/// as they compress; nothing is held back beyond the encoder's internal
/// window. [`finish`] drains the encoder, emits the data descriptor, and
/// releases the session for the next entry.
///
/// [`write`]: EntryWriter::write
/// [`finish`]: EntryWriter::finish
#[derive(Debug)]
pub struct EntryWriter<'a, W> {
    name: String,
    header_offset: u64,
    encoder: DeflateEncoder<Vec<u8>>,
    crc: Crc,
    uncompressed: u64,
    compressed: u64,
    archive: &'a mut ArchiveWriter<W>,
}

impl<W: AsyncWrite + Unpin + Send> EntryWriter<'_, W> {
    /// Entry name as it will appear in the container.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a chunk of entry content.
    pub async fn write(&mut self, data: &[u8]) -> ArchiveResult<()> {
        self.crc.update(data);
        self.uncompressed += data.len() as u64;
        self.encoder.write_all(data)?;
        self.flush_compressed().await
    }

    /// Finalize the entry: drain the encoder and write the data descriptor.
    pub async fn finish(mut self) -> ArchiveResult<()> {
        self.flush_compressed().await?;
        let tail = self.encoder.finish()?;
        if !tail.is_empty() {
            self.compressed += tail.len() as u64;
            self.archive.put(&tail).await?;
        }

        let record = DirectoryRecord {
            name: self.name,
            crc: self.crc.sum(),
            compressed: self.compressed,
            uncompressed: self.uncompressed,
            header_offset: self.header_offset,
        };
        let (compressed, uncompressed) = sizes_u32(&record)?;

        let mut descriptor = BytesMut::with_capacity(16);
        descriptor.put_u32_le(DESCRIPTOR_SIG);
        descriptor.put_u32_le(record.crc);
        descriptor.put_u32_le(compressed);
        descriptor.put_u32_le(uncompressed);
        self.archive.put(&descriptor).await?;

        self.archive.directory.push(record);
        self.archive.poisoned = false;
        Ok(())
    }

    /// Move whatever the encoder has produced so far out to the sink.
    async fn flush_compressed(&mut self) -> ArchiveResult<()> {
        let buffered = std::mem::take(self.encoder.get_mut());
        if !buffered.is_empty() {
            self.compressed += buffered.len() as u64;
            self.archive.put(&buffered).await?;
        }
        Ok(())
    }
}

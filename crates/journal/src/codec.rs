use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::Path;

use fsops::FileKind;
use tracing::debug;

use crate::error::JournalError;
use crate::record::FileRecord;
use crate::Journal;

const MAGIC_START: [u8; 4] = *b"AIj!";
const MAGIC_END: [u8; 4] = *b"!AIj";

const KIND_REGULAR: u8 = 0;
const KIND_DIRECTORY: u8 = 1;
/// Wire-only sentinel terminating the record stream.
const KIND_END_OF_LIST: u8 = 2;

const FLAG_EXISTED: u32 = 1 << 0;

/// Chunk size for length-prefixed string reads. Bounds the allocation a
/// corrupt length field can trigger before the stream runs dry.
const STRING_CHUNK: usize = 4096;

impl Journal {
    /// Persists the journal at `path`.
    ///
    /// The record stream is written to a sibling temp file and renamed
    /// over the target on success, so an interrupted save leaves any
    /// previous journal intact.
    pub fn save(&self, path: &Path) -> Result<(), JournalError> {
        let io_err = |source| JournalError::Io {
            path: path.to_path_buf(),
            source,
        };

        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut stem = path
            .file_name()
            .map_or_else(OsString::new, ToOwned::to_owned);
        stem.push(".");

        let mut temp = tempfile::Builder::new()
            .prefix(&stem)
            .tempfile_in(dir.unwrap_or_else(|| Path::new(".")))
            .map_err(io_err)?;

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            self.encode(&mut writer).map_err(io_err)?;
            writer.flush().map_err(io_err)?;
        }

        temp.as_file().sync_all().map_err(io_err)?;
        temp.persist(path).map_err(|e| io_err(e.error))?;

        debug!(journal = %path.display(), files = self.files.len(), "journal saved");
        Ok(())
    }

    /// Reads a journal back from `path`, validating both magics and
    /// detecting truncation.
    pub fn load(path: &Path) -> Result<Self, JournalError> {
        let file = File::open(path).map_err(|source| JournalError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        read_exact(&mut reader, &mut magic, path)?;
        if magic != MAGIC_START {
            return Err(JournalError::BadMagic {
                path: path.to_path_buf(),
            });
        }

        let source_root = read_os_string(&mut reader, path)?;
        let dest_root = read_os_string(&mut reader, path)?;
        let new_prefix = read_os_string(&mut reader, path)?;
        let backup_prefix = read_os_string(&mut reader, path)?;

        let mut files = Vec::new();
        loop {
            let kind = match read_u8(&mut reader, path)? {
                KIND_END_OF_LIST => break,
                KIND_REGULAR => FileKind::Regular,
                KIND_DIRECTORY => FileKind::Directory,
                kind => {
                    return Err(JournalError::UnknownKind {
                        kind,
                        path: path.to_path_buf(),
                    });
                }
            };

            let rel_path = read_os_string(&mut reader, path)?;
            let mut digest = [0u8; 16];
            read_exact(&mut reader, &mut digest, path)?;
            let mtime = read_i64(&mut reader, path)?;
            let flags = read_u32(&mut reader, path)?;

            // Flag bits beyond the ones this build knows are ignored.
            files.push(FileRecord::from_parts(
                rel_path,
                kind,
                checksums::ContentDigest(digest),
                mtime,
                flags & FLAG_EXISTED != 0,
            ));
        }

        read_exact(&mut reader, &mut magic, path)?;
        if magic != MAGIC_END {
            return Err(JournalError::BadEndMagic {
                path: path.to_path_buf(),
            });
        }

        Ok(Self {
            source_root: source_root.into(),
            dest_root: dest_root.into(),
            new_prefix,
            backup_prefix,
            files,
        })
    }

    fn encode(&self, writer: &mut impl Write) -> io::Result<()> {
        writer.write_all(&MAGIC_START)?;

        write_bytes(writer, self.source_root.as_os_str().as_bytes())?;
        write_bytes(writer, self.dest_root.as_os_str().as_bytes())?;
        write_bytes(writer, self.new_prefix.as_bytes())?;
        write_bytes(writer, self.backup_prefix.as_bytes())?;

        for record in &self.files {
            let kind = match record.kind() {
                FileKind::Regular => KIND_REGULAR,
                FileKind::Directory => KIND_DIRECTORY,
            };
            writer.write_all(&[kind])?;
            write_bytes(writer, record.path().as_bytes())?;
            writer.write_all(&record.digest().0)?;
            writer.write_all(&record.mtime().to_le_bytes())?;

            let flags = if record.existed() { FLAG_EXISTED } else { 0 };
            writer.write_all(&flags.to_le_bytes())?;
        }

        writer.write_all(&[KIND_END_OF_LIST])?;
        writer.write_all(&MAGIC_END)?;
        Ok(())
    }
}

fn write_bytes(writer: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    writer.write_all(&(bytes.len() as u64).to_le_bytes())?;
    writer.write_all(bytes)
}

fn read_exact(reader: &mut impl Read, buf: &mut [u8], path: &Path) -> Result<(), JournalError> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            JournalError::ShortRead {
                path: path.to_path_buf(),
            }
        } else {
            JournalError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

fn read_u8(reader: &mut impl Read, path: &Path) -> Result<u8, JournalError> {
    let mut buf = [0u8; 1];
    read_exact(reader, &mut buf, path)?;
    Ok(buf[0])
}

fn read_u32(reader: &mut impl Read, path: &Path) -> Result<u32, JournalError> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf, path)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(reader: &mut impl Read, path: &Path) -> Result<u64, JournalError> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf, path)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_i64(reader: &mut impl Read, path: &Path) -> Result<i64, JournalError> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf, path)?;
    Ok(i64::from_le_bytes(buf))
}

/// Reads a length-prefixed byte string in bounded chunks, so a corrupt
/// length hits [`JournalError::ShortRead`] instead of a huge allocation.
fn read_os_string(reader: &mut impl Read, path: &Path) -> Result<OsString, JournalError> {
    let len = read_u64(reader, path)? as usize;

    let mut out = Vec::with_capacity(len.min(STRING_CHUNK));
    let mut buf = [0u8; STRING_CHUNK];
    let mut remaining = len;
    while remaining > 0 {
        let take = remaining.min(STRING_CHUNK);
        read_exact(reader, &mut buf[..take], path)?;
        out.extend_from_slice(&buf[..take]);
        remaining -= take;
    }

    Ok(OsString::from_vec(out))
}

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::reference::{CacheRecord, CanonicalKey, KeyError, NUM_SLOTS};

/// Header: the cutoff setting as a big-endian `i32`.
pub const HEADER_SIZE: usize = 4;
/// Fixed width of one stored record.
pub const RECORD_SIZE: usize = 34;

#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("archive shorter than its header")]
    MissingHeader,
    #[error("{0} trailing bytes do not form a record")]
    Truncated(usize),
    #[error("corrupt record: {0}")]
    CorruptKey(#[from] KeyError),
}

/// Decoded archive contents in file order. Keys may repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    pub cutoff: i32,
    pub entries: Vec<(CanonicalKey, CacheRecord)>,
}

#[inline]
fn read_u16_be(bytes: &[u8]) -> Option<u16> {
    if bytes.len() < 2 { return None; }
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

#[inline]
fn read_i32_be(bytes: &[u8]) -> Option<i32> {
    if bytes.len() < 4 { return None; }
    Some(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[inline]
fn read_u64_be(bytes: &[u8]) -> Option<u64> {
    if bytes.len() < 8 { return None; }
    Some(u64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]))
}

pub fn encode_header(cutoff: i32) -> [u8; HEADER_SIZE] {
    cutoff.to_be_bytes()
}

/// Encode one record.
///
/// Layout: transform key (8) | group (1) | hash1 (4) | hash2 (4) | hashcode (4) |
/// estimates (4) | partial paths (4 x 2) | status (1), all big-endian.
pub fn encode_record(key: &CanonicalKey, record: &CacheRecord) -> [u8; RECORD_SIZE] {
    let mut buf = Vec::with_capacity(RECORD_SIZE);
    buf.extend_from_slice(&key.transform_key().to_be_bytes());
    buf.push(key.group());
    buf.extend_from_slice(&key.hash1().to_be_bytes());
    buf.extend_from_slice(&key.hash2().to_be_bytes());
    buf.extend_from_slice(&key.hashcode().to_be_bytes());
    buf.extend_from_slice(&record.estimates());
    for p in record.partial_paths() {
        buf.extend_from_slice(&p.to_be_bytes());
    }
    buf.push(record.status());
    let mut out = [0u8; RECORD_SIZE];
    out.copy_from_slice(&buf);
    out
}

/// Decode one record from the front of `bytes`.
pub fn decode_record(bytes: &[u8]) -> Result<(CanonicalKey, CacheRecord), ArchiveError> {
    if bytes.len() < RECORD_SIZE {
        return Err(ArchiveError::Truncated(bytes.len()));
    }
    let short = || ArchiveError::Truncated(bytes.len());
    let transform_key = read_u64_be(&bytes[0..]).ok_or_else(short)?;
    let group = bytes[8];
    let hash1 = read_i32_be(&bytes[9..]).ok_or_else(short)?;
    let hash2 = read_i32_be(&bytes[13..]).ok_or_else(short)?;
    let hashcode = read_i32_be(&bytes[17..]).ok_or_else(short)?;
    let key = CanonicalKey::from_parts(transform_key, group, hash1, hash2, hashcode)?;

    let mut off = 21;
    let mut estimates = [0u8; NUM_SLOTS];
    estimates.copy_from_slice(&bytes[off..off + NUM_SLOTS]);
    off += NUM_SLOTS;
    let mut paths = [0u16; NUM_SLOTS];
    for p in paths.iter_mut() {
        *p = read_u16_be(&bytes[off..]).ok_or_else(short)?;
        off += 2;
    }
    Ok((key, CacheRecord::from_parts(estimates, paths, bytes[off])))
}

/// Parse a whole archive. Any leftover bytes after the last full record fail the load.
pub fn parse_archive(bytes: &[u8]) -> Result<Archive, ArchiveError> {
    let cutoff = read_i32_be(bytes).ok_or(ArchiveError::MissingHeader)?;
    let body = &bytes[HEADER_SIZE..];
    let chunks = body.chunks_exact(RECORD_SIZE);
    let trailing = chunks.remainder().len();
    if trailing != 0 {
        return Err(ArchiveError::Truncated(trailing));
    }
    let entries = chunks.map(decode_record).collect::<Result<Vec<_>, _>>()?;
    Ok(Archive { cutoff, entries })
}

pub fn read_archive<P: AsRef<Path>>(path: P) -> Result<Archive, ArchiveError> {
    let bytes = fs::read(path)?;
    parse_archive(&bytes)
}

/// Replace whatever is at `path` with a header-only archive, creating parent directories.
pub fn create_archive<P: AsRef<Path>>(path: P, cutoff: i32) -> Result<(), ArchiveError> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, encode_header(cutoff))?;
    Ok(())
}

/// Append one record to an existing archive.
pub fn append_record<P: AsRef<Path>>(
    path: P,
    key: &CanonicalKey,
    record: &CacheRecord,
) -> Result<(), ArchiveError> {
    let mut f = OpenOptions::new().append(true).open(path)?;
    f.write_all(&encode_record(key, record))?;
    Ok(())
}

/// Write a complete archive in one pass.
pub fn write_archive<'a, P, I>(path: P, cutoff: i32, entries: I) -> Result<(), ArchiveError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (&'a CanonicalKey, &'a CacheRecord)>,
{
    let mut buf = encode_header(cutoff).to_vec();
    for (key, record) in entries {
        buf.extend_from_slice(&encode_record(key, record));
    }
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, buf)?;
    Ok(())
}

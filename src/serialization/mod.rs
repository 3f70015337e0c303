//! On-disk format of the reference archive.
//!
//! A 4-byte big-endian cutoff header followed by fixed 34-byte records. There is no
//! magic or version; the format is defined entirely by its layout. Admissions append
//! one record each, so a key may appear several times and later copies are merged on
//! load.

mod archive;

pub use archive::{
    Archive,
    ArchiveError,
    HEADER_SIZE,
    RECORD_SIZE,
    encode_header,
    encode_record,
    decode_record,
    parse_archive,
    read_archive,
    create_archive,
    append_record,
    write_archive,
};

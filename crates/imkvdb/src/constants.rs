//! Constants of the IMKVDB format.

/// Magic bytes at the start of an archive.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"IMKV";

/// Magic bytes at the start of every entry.
pub const ENTRY_MAGIC: [u8; 4] = *b"IMEN";

/// Length of the archive header in bytes.
pub const HEADER_LENGTH: usize = 12;

/// Length of the fixed-size part of an entry in bytes (magic and two lengths).
///
/// This is also the smallest an entry can possibly be on the wire.
pub const ENTRY_HEADER_LENGTH: usize = 12;

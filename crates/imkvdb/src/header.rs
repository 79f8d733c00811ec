//! IMKVDB Header structure.
//!
//! The header identifies the file as an IMKVDB archive and says how many entries follow. It is
//! always exactly [`HEADER_LENGTH`][crate::constants::HEADER_LENGTH] bytes:
//!
//! ```text
//! 49 4D 4B 56  00 00 00 00  NN NN NN NN
//! "IMKV"       reserved     entry count (u32 LE)
//! ```

use deku::prelude::*;

/// IMKVDB Header
#[derive(Clone, Debug, Eq, PartialEq, DekuRead, DekuWrite)]
#[deku(endian = "little", magic = b"IMKV")]
pub struct Header {
	/// Number of entries following the header.
	///
	/// Preceded by four reserved bytes, which are ignored on read and written as zeroes.
	#[deku(bytes = "4", pad_bytes_before = "4")]
	pub entry_count: u32,
}

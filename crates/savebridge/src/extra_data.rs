//! The `ExtraData0` per-slot metadata record.
//!
//! Every save slot folder holds one of these. It's a fixed 512-byte structure, mostly zeroes:
//!
//! ```text
//! 0x000  title id (u64 LE)
//! 0x008  user id (16 bytes)
//! 0x040  title id again (u64 LE)
//! 0x050  flags (u32 LE)
//! 0x060  journal size (u64 LE)
//! 0x068  commit id (u64 LE)
//! 0x070  zeroes until 0x200
//! ```

use deku::prelude::*;

use crate::{
	error::Error,
	ids::{TitleId, UserId},
};

/// Length of the record in bytes.
pub const EXTRA_DATA_LENGTH: usize = 512;

/// Name of the record's file inside a slot folder.
pub const EXTRA_DATA_FILENAME: &str = "ExtraData0";

/// Values written into new records for fields that aren't the title.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtraDataDefaults {
	/// Owning user.
	pub user_id: UserId,

	/// Save data flags.
	pub flags: u32,

	/// Journal size.
	pub journal_size: u64,

	/// Commit identifier.
	pub commit_id: u64,
}

impl Default for ExtraDataDefaults {
	fn default() -> Self {
		Self {
			user_id: UserId::DEFAULT,
			flags: 0,
			journal_size: 0x10,
			commit_id: 0,
		}
	}
}

/// ExtraData record
#[derive(Clone, Debug, Eq, PartialEq, DekuRead, DekuWrite)]
#[deku(endian = "little")]
pub struct ExtraData {
	/// Title (program) id.
	#[deku(bytes = "8")]
	pub title_id: u64,

	/// Owning user id.
	#[deku(pad_bytes_after = "40")]
	pub user_id: [u8; 16],

	/// Title id again. Should match [`title_id`](Self::title_id).
	#[deku(bytes = "8", pad_bytes_after = "8")]
	pub title_id_again: u64,

	/// Save data flags.
	#[deku(bytes = "4", pad_bytes_after = "12")]
	pub flags: u32,

	/// Journal size.
	#[deku(bytes = "8")]
	pub journal_size: u64,

	/// Commit identifier.
	#[deku(bytes = "8", pad_bytes_after = "400")]
	pub commit_id: u64,
}

impl ExtraData {
	/// A fresh record for a title.
	pub fn new(title: TitleId, defaults: &ExtraDataDefaults) -> Self {
		Self {
			title_id: title.0,
			user_id: defaults.user_id.0,
			title_id_again: title.0,
			flags: defaults.flags,
			journal_size: defaults.journal_size,
			commit_id: defaults.commit_id,
		}
	}

	/// Parse a full record.
	///
	/// Needs at least [`EXTRA_DATA_LENGTH`] bytes; anything after that is ignored. Padding isn't
	/// checked, nor is the duplicated title id: see [`is_consistent()`](Self::is_consistent).
	pub fn parse(bytes: &[u8]) -> crate::error::Result<Self> {
		if bytes.len() < EXTRA_DATA_LENGTH {
			return Err(Error::ShortExtraData(bytes.len()));
		}

		let (_, record) = Self::from_bytes((&bytes[..EXTRA_DATA_LENGTH], 0))?;
		Ok(record)
	}

	/// Write the record out.
	pub fn encode(&self) -> crate::error::Result<Vec<u8>> {
		let bytes = self.to_bytes()?;
		debug_assert_eq!(bytes.len(), EXTRA_DATA_LENGTH);
		Ok(bytes)
	}

	/// The title this record is for.
	pub fn title(&self) -> TitleId {
		TitleId(self.title_id)
	}

	/// The user this record belongs to.
	pub fn user(&self) -> UserId {
		UserId(self.user_id)
	}

	/// Whether both copies of the title id agree.
	pub fn is_consistent(&self) -> bool {
		self.title_id == self.title_id_again
	}
}

/// Encode a fresh record for a title.
pub fn encode(title: TitleId, defaults: &ExtraDataDefaults) -> crate::error::Result<Vec<u8>> {
	ExtraData::new(title, defaults).encode()
}

/// Read just the title id from the start of a record.
///
/// This is all that's needed to match a slot to a title, and is deliberately lenient: anything
/// with at least eight bytes has a title id.
pub fn title_id_of(bytes: &[u8]) -> Option<TitleId> {
	let head: [u8; 8] = bytes.get(..8)?.try_into().ok()?;
	Some(TitleId(u64::from_le_bytes(head)))
}

#[cfg(test)]
mod tests {
	use super::*;

	const TITLE: TitleId = TitleId(0x0100a2c801c6e000);

	#[test]
	fn default_record_layout() {
		let bytes = encode(TITLE, &ExtraDataDefaults::default()).expect("encodes");
		assert_eq!(bytes.len(), EXTRA_DATA_LENGTH);

		assert_eq!(&bytes[0..8], &[0x00, 0xe0, 0xc6, 0x01, 0xc8, 0xa2, 0x00, 0x01]);
		assert_eq!(&bytes[64..72], &bytes[0..8]);
		assert_eq!(&bytes[8..24], &UserId::DEFAULT.0);
		assert_eq!(&bytes[80..84], &[0; 4]);
		assert_eq!(&bytes[96..104], &[0x10, 0, 0, 0, 0, 0, 0, 0]);
		assert_eq!(&bytes[104..112], &[0; 8]);

		let fields = [0..24, 64..72, 80..84, 96..112];
		for (offset, byte) in bytes.iter().enumerate() {
			if !fields.iter().any(|field| field.contains(&offset)) {
				assert_eq!(*byte, 0, "byte {offset} should be zero");
			}
		}
	}

	#[test]
	fn title_id_survives() {
		let bytes = encode(TITLE, &ExtraDataDefaults::default()).expect("encodes");
		assert_eq!(title_id_of(&bytes), Some(TITLE));
	}

	#[test]
	fn title_id_needs_eight_bytes() {
		assert_eq!(title_id_of(&[1, 2, 3, 4, 5, 6, 7]), None);
		assert_eq!(title_id_of(&[]), None);
		assert_eq!(title_id_of(&[1, 0, 0, 0, 0, 0, 0, 0]), Some(TitleId(1)));
	}

	#[test]
	fn custom_defaults_are_written() {
		let defaults = ExtraDataDefaults {
			user_id: UserId([0xAA; 16]),
			flags: 0x0102_0304,
			journal_size: 0x4000,
			commit_id: 7,
		};
		let bytes = encode(TITLE, &defaults).expect("encodes");
		assert_eq!(&bytes[8..24], &[0xAA; 16]);
		assert_eq!(&bytes[80..84], &[4, 3, 2, 1]);
		assert_eq!(&bytes[96..104], &[0, 0x40, 0, 0, 0, 0, 0, 0]);
		assert_eq!(&bytes[104..112], &[7, 0, 0, 0, 0, 0, 0, 0]);

		let record = ExtraData::parse(&bytes).expect("parses");
		assert_eq!(record, ExtraData::new(TITLE, &defaults));
		assert_eq!(record.user(), defaults.user_id);
		assert!(record.is_consistent());
	}

	#[test]
	fn parse_wants_a_full_record() {
		let bytes = encode(TITLE, &ExtraDataDefaults::default()).expect("encodes");
		assert!(matches!(
			ExtraData::parse(&bytes[..100]),
			Err(Error::ShortExtraData(100))
		));
	}

	#[test]
	fn parse_reports_mismatched_duplicate() {
		let mut bytes = encode(TITLE, &ExtraDataDefaults::default()).expect("encodes");
		bytes[64] ^= 0xFF;
		let record = ExtraData::parse(&bytes).expect("still parses");
		assert_eq!(record.title(), TITLE);
		assert!(!record.is_consistent());
	}
}

//! The archive itself: an ordered map of byte-string keys to byte-string values.
//!
//! Order is the order entries were inserted, or the order they appear on disk for a decoded
//! archive. Writing an archive back out preserves that order, so an archive that is decoded and
//! re-encoded without changes is byte-identical (minus any trailing garbage).

use std::collections::HashMap;

use deku::prelude::*;
use tracing::{debug, instrument, trace, warn};

use crate::{
	constants::{ARCHIVE_MAGIC, ENTRY_HEADER_LENGTH, ENTRY_MAGIC, HEADER_LENGTH},
	entry::EntryFrame,
	error::{ErrorKind, Result, SimpleError, SourceError},
	header::Header,
};

/// Bytes of context to include in error snippets on either side of the error.
const SNIPPET_CONTEXT: usize = 16;

/// IMKVDB archive contents.
#[derive(Clone, Debug, Default)]
pub struct Archive {
	entries: Vec<(Vec<u8>, Vec<u8>)>,
	index: HashMap<Vec<u8>, usize>,
}

impl PartialEq for Archive {
	fn eq(&self, other: &Self) -> bool {
		self.entries == other.entries
	}
}

impl Eq for Archive {}

impl Archive {
	/// New empty archive.
	pub fn new() -> Self {
		Self::default()
	}

	fn with_capacity(capacity: usize) -> Self {
		Self {
			entries: Vec::with_capacity(capacity),
			index: HashMap::with_capacity(capacity),
		}
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether there are no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Look up the value for a key.
	pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
		self.index
			.get(key)
			.map(|&position| self.entries[position].1.as_slice())
	}

	/// Whether the key is present.
	pub fn contains_key(&self, key: &[u8]) -> bool {
		self.index.contains_key(key)
	}

	/// Insert a key and value, replacing the value if the key is already present.
	///
	/// A replaced value keeps its original position. Returns the previous value, if any.
	pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) -> Option<Vec<u8>> {
		if let Some(&position) = self.index.get(&key) {
			return Some(std::mem::replace(&mut self.entries[position].1, value));
		}

		self.index.insert(key.clone(), self.entries.len());
		self.entries.push((key, value));
		None
	}

	/// Insert a key and value only if the key isn't already present.
	///
	/// Returns whether the entry was added. An existing entry is never modified.
	pub fn insert_new(&mut self, key: Vec<u8>, value: Vec<u8>) -> bool {
		if self.index.contains_key(&key) {
			return false;
		}

		self.index.insert(key.clone(), self.entries.len());
		self.entries.push((key, value));
		true
	}

	/// Iterate over the entries in order.
	pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
		self.entries
			.iter()
			.map(|(key, value)| (key.as_slice(), value.as_slice()))
	}

	/// Decode an archive.
	///
	/// Bytes after the last entry the header declares are ignored.
	#[instrument(level = "debug", skip(bytes), fields(length = bytes.len()))]
	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		if !bytes.starts_with(&ARCHIVE_MAGIC) {
			return Err(SourceError::from_source(ErrorKind::InvalidMagic, bytes, 0, SNIPPET_CONTEXT).into());
		}

		if bytes.len() < HEADER_LENGTH {
			return Err(ErrorKind::Truncated {
				needed: HEADER_LENGTH,
				available: bytes.len(),
			}
			.into());
		}

		let ((mut rest, _), header) =
			Header::from_bytes((bytes, 0)).map_err(SimpleError::from_deku)?;
		debug!(?header, "read imkvdb header");

		if (header.entry_count as usize).saturating_mul(ENTRY_HEADER_LENGTH) > rest.len() {
			return Err(ErrorKind::CountOverrun {
				count: header.entry_count,
				available: rest.len(),
			}
			.into());
		}

		let mut archive = Self::with_capacity(header.entry_count as usize);
		for index in 0..header.entry_count {
			let offset = bytes.len() - rest.len();

			if rest.len() < ENTRY_HEADER_LENGTH {
				return Err(SourceError::from_source(
					ErrorKind::Truncated {
						needed: ENTRY_HEADER_LENGTH,
						available: rest.len(),
					},
					bytes,
					offset,
					SNIPPET_CONTEXT,
				)
				.into());
			}

			if !rest.starts_with(&ENTRY_MAGIC) {
				return Err(SourceError::from_source(
					ErrorKind::InvalidEntryMagic { index },
					bytes,
					offset,
					SNIPPET_CONTEXT,
				)
				.into());
			}

			// check lengths before deku allocates anything for them
			let key_length = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]) as u64;
			let value_length = u32::from_le_bytes([rest[8], rest[9], rest[10], rest[11]]) as u64;
			let needed = ENTRY_HEADER_LENGTH as u64 + key_length + value_length;
			if needed > rest.len() as u64 {
				return Err(SourceError::from_source(
					ErrorKind::Truncated {
						needed: usize::try_from(needed).unwrap_or(usize::MAX),
						available: rest.len(),
					},
					bytes,
					offset,
					SNIPPET_CONTEXT,
				)
				.into());
			}

			let ((next, _), frame) = EntryFrame::from_bytes((rest, 0))
				.map_err(|err| SourceError::from_deku(err, bytes, offset, SNIPPET_CONTEXT))?;
			rest = next;
			trace!(%index, key=?frame.key, value=?frame.value, "read imkvdb entry");

			if !archive.insert_new(frame.key, frame.value) {
				return Err(SourceError::from_source(
					ErrorKind::DuplicateKey { index },
					bytes,
					offset,
					SNIPPET_CONTEXT,
				)
				.into());
			}
		}

		if !rest.is_empty() {
			warn!(trailing=%rest.len(), "ignoring bytes after the last imkvdb entry");
		}

		Ok(archive)
	}

	/// Encode the archive.
	#[instrument(level = "debug", skip(self), fields(entries = self.len()))]
	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		let header = Header {
			entry_count: u32::try_from(self.len())
				.map_err(|_| ErrorKind::TooLarge("entry count"))?,
		};

		let mut bytes = header.to_bytes().map_err(SimpleError::from_deku)?;
		for (key, value) in self.iter() {
			let frame =
				EntryFrame::create(key, value).map_err(|_| ErrorKind::TooLarge("entry"))?;
			bytes.reserve(frame.wire_length());
			bytes.extend(frame.to_bytes().map_err(SimpleError::from_deku)?);
		}

		debug!(length=%bytes.len(), "wrote imkvdb archive");
		Ok(bytes)
	}
}

impl FromIterator<(Vec<u8>, Vec<u8>)> for Archive {
	fn from_iter<T: IntoIterator<Item = (Vec<u8>, Vec<u8>)>>(iter: T) -> Self {
		let mut archive = Self::new();
		for (key, value) in iter {
			archive.insert(key, value);
		}
		archive
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	fn sample() -> Archive {
		[
			(b"first".to_vec(), vec![1, 2, 3]),
			(b"second".to_vec(), vec![]),
			(b"third".to_vec(), vec![0xFF; 64]),
		]
		.into_iter()
		.collect()
	}

	#[test]
	fn empty_archive_is_just_a_header() {
		let bytes = Archive::new().to_bytes().expect("encodes");
		assert_eq!(bytes, b"IMKV\0\0\0\0\0\0\0\0");
		assert_eq!(Archive::from_bytes(&bytes).expect("decodes"), Archive::new());
	}

	#[test]
	fn encodes_in_insertion_order() {
		let mut archive = Archive::new();
		archive.insert(b"b".to_vec(), b"2".to_vec());
		archive.insert(b"a".to_vec(), b"1".to_vec());
		let bytes = archive.to_bytes().expect("encodes");

		#[rustfmt::skip]
		let expected = [
			b'I', b'M', b'K', b'V', 0, 0, 0, 0, 2, 0, 0, 0,
			b'I', b'M', b'E', b'N', 1, 0, 0, 0, 1, 0, 0, 0, b'b', b'2',
			b'I', b'M', b'E', b'N', 1, 0, 0, 0, 1, 0, 0, 0, b'a', b'1',
		];
		assert_eq!(bytes, expected);
	}

	#[test]
	fn insert_replaces_in_place() {
		let mut archive = sample();
		assert_eq!(archive.insert(b"first".to_vec(), vec![9]), Some(vec![1, 2, 3]));
		assert_eq!(archive.len(), 3);
		assert_eq!(archive.iter().next(), Some((&b"first"[..], &[9][..])));
	}

	#[test]
	fn insert_new_never_overwrites() {
		let mut archive = sample();
		assert!(!archive.insert_new(b"second".to_vec(), vec![7]));
		assert_eq!(archive.get(b"second"), Some(&[][..]));
		assert!(archive.insert_new(b"fourth".to_vec(), vec![7]));
		assert_eq!(archive.len(), 4);
	}

	#[test]
	fn rejects_bad_magic() {
		let mut bytes = sample().to_bytes().expect("encodes");
		bytes[0] = b'X';
		let err = Archive::from_bytes(&bytes).expect_err("bad magic");
		assert_eq!(err.kind(), ErrorKind::InvalidMagic);
	}

	#[test]
	fn rejects_empty_input() {
		let err = Archive::from_bytes(&[]).expect_err("no bytes");
		assert_eq!(err.kind(), ErrorKind::InvalidMagic);
	}

	#[test]
	fn rejects_short_header() {
		let err = Archive::from_bytes(b"IMKV\0\0").expect_err("short header");
		assert_eq!(
			err.kind(),
			ErrorKind::Truncated {
				needed: 12,
				available: 6
			}
		);
	}

	#[test]
	fn rejects_count_larger_than_data() {
		let bytes = b"IMKV\0\0\0\0\xFF\0\0\0";
		let err = Archive::from_bytes(bytes).expect_err("count overrun");
		assert_eq!(
			err.kind(),
			ErrorKind::CountOverrun {
				count: 255,
				available: 0
			}
		);
	}

	#[test]
	fn rejects_bad_entry_magic() {
		let mut bytes = sample().to_bytes().expect("encodes");
		// second entry starts after the header and the first entry (12 + 5 + 3 bytes)
		let second = HEADER_LENGTH + ENTRY_HEADER_LENGTH + 5 + 3;
		assert_eq!(&bytes[second..second + 4], &ENTRY_MAGIC);
		bytes[second] = b'X';

		let err = Archive::from_bytes(&bytes).expect_err("bad entry magic");
		assert_eq!(err.kind(), ErrorKind::InvalidEntryMagic { index: 1 });
	}

	#[test]
	fn rejects_truncated_entry() {
		let bytes = sample().to_bytes().expect("encodes");
		let err = Archive::from_bytes(&bytes[..bytes.len() - 1]).expect_err("truncated");
		assert!(matches!(err.kind(), ErrorKind::Truncated { .. }));
	}

	#[test]
	fn rejects_oversized_key_length() {
		let mut bytes = b"IMKV\0\0\0\0\x01\0\0\0".to_vec();
		bytes.extend_from_slice(b"IMEN\xFF\xFF\xFF\xFF\0\0\0\0");
		let err = Archive::from_bytes(&bytes).expect_err("key longer than data");
		assert!(matches!(err.kind(), ErrorKind::Truncated { .. }));
	}

	#[test]
	fn rejects_duplicate_keys() {
		let mut bytes = b"IMKV\0\0\0\0\x02\0\0\0".to_vec();
		for _ in 0..2 {
			bytes.extend_from_slice(b"IMEN\x01\0\0\0\x01\0\0\0k!");
		}
		let err = Archive::from_bytes(&bytes).expect_err("duplicate");
		assert_eq!(err.kind(), ErrorKind::DuplicateKey { index: 1 });
	}

	#[test]
	fn ignores_trailing_bytes() {
		let mut bytes = sample().to_bytes().expect("encodes");
		bytes.extend_from_slice(&[0; 7]);
		assert_eq!(Archive::from_bytes(&bytes).expect("decodes"), sample());
	}

	proptest! {
		#[test]
		fn decode_inverts_encode(
			entries in proptest::collection::vec(
				(
					proptest::collection::vec(any::<u8>(), 1..96),
					proptest::collection::vec(any::<u8>(), 0..96),
				),
				0..24,
			)
		) {
			let archive: Archive = entries.into_iter().collect();
			let bytes = archive.to_bytes().expect("encodes");
			prop_assert_eq!(Archive::from_bytes(&bytes).expect("decodes"), archive);
		}
	}
}

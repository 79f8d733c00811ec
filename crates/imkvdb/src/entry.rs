//! Entry framing: magic, key and value lengths, then the key and value bytes.

use std::num::TryFromIntError;

use deku::prelude::*;

/// IMKVDB Entry framing
///
/// Each entry is a magic, the two payload lengths, then the key and value bytes back to back.
#[derive(Clone, Debug, Eq, PartialEq, DekuRead, DekuWrite)]
#[deku(endian = "little", magic = b"IMEN")]
pub struct EntryFrame {
	/// Length of the key in bytes.
	#[deku(bytes = "4", update = "self.key.len()")]
	pub key_length: u32,

	/// Length of the value in bytes.
	#[deku(bytes = "4", update = "self.value.len()")]
	pub value_length: u32,

	/// Key bytes.
	#[deku(count = "key_length")]
	pub key: Vec<u8>,

	/// Value bytes.
	#[deku(count = "value_length")]
	pub value: Vec<u8>,
}

impl EntryFrame {
	/// Frame a key and value.
	///
	/// Returns `Err` if either doesn't fit in a 32-bit length.
	pub fn create(key: &[u8], value: &[u8]) -> Result<Self, TryFromIntError> {
		Ok(Self {
			key_length: u32::try_from(key.len())?,
			value_length: u32::try_from(value.len())?,
			key: key.to_vec(),
			value: value.to_vec(),
		})
	}

	/// Length of the whole frame on the wire.
	pub fn wire_length(&self) -> usize {
		crate::constants::ENTRY_HEADER_LENGTH + self.key.len() + self.value.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn frame_layout() {
		let frame = EntryFrame::create(&[0xAB; 2], &[0xCD; 3]).expect("small frame");
		let bytes = frame.to_bytes().expect("frame serialises");
		assert_eq!(bytes.len(), frame.wire_length());
		assert_eq!(
			bytes,
			[
				b'I', b'M', b'E', b'N', // magic
				2, 0, 0, 0, // key length
				3, 0, 0, 0, // value length
				0xAB, 0xAB, // key
				0xCD, 0xCD, 0xCD, // value
			]
		);
	}

	#[test]
	fn reads_back_and_leaves_rest() {
		let mut bytes = EntryFrame::create(b"key", b"value")
			.expect("small frame")
			.to_bytes()
			.expect("frame serialises");
		bytes.extend_from_slice(b"tail");

		let ((rest, _), frame) = EntryFrame::from_bytes((&bytes, 0)).expect("frame parses");
		assert_eq!(frame.key, b"key");
		assert_eq!(frame.value, b"value");
		assert_eq!(rest, b"tail");
	}
}

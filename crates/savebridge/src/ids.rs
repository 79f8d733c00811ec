//! Identifiers: titles, save slots, and user accounts.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Error parsing an identifier from hex.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid {what}: {input:?}")]
pub struct ParseIdError {
	what: &'static str,
	input: String,
}

impl ParseIdError {
	fn new(what: &'static str, input: &str) -> Self {
		Self {
			what,
			input: input.into(),
		}
	}
}

/// Parse 1 to 16 hex digits, and nothing else.
///
/// `u64::from_str_radix` alone would also take a leading `+`.
fn parse_hex_u64(s: &str) -> Option<u64> {
	if s.is_empty() || s.len() > 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
		return None;
	}

	u64::from_str_radix(s, 16).ok()
}

/// Title (program) identifier, naming a game or application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TitleId(pub u64);

impl TitleId {
	/// Extract a title id and name from a Checkpoint folder name.
	///
	/// These look like `0x0100A2C801C6E000 Some Game`: the id in hex with a `0x` prefix, a space,
	/// then the name. The name may be missing entirely.
	pub fn from_folder_name(folder: &str) -> Option<(Self, &str)> {
		let (id, name) = folder.split_once(' ').unwrap_or((folder, ""));
		let hex = id.strip_prefix("0x").or_else(|| id.strip_prefix("0X"))?;
		parse_hex_u64(hex).map(|id| (Self(id), name))
	}

	/// The id as little-endian bytes, as it's stored on disk.
	pub fn to_le_bytes(self) -> [u8; 8] {
		self.0.to_le_bytes()
	}
}

impl fmt::Display for TitleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:016x}", self.0)
	}
}

impl FromStr for TitleId {
	type Err = ParseIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let hex = s.strip_prefix("0x").unwrap_or(s);
		parse_hex_u64(hex)
			.map(Self)
			.ok_or_else(|| ParseIdError::new("title id", s))
	}
}

/// Save slot identifier.
///
/// Slots are folders named with this id in 16 lowercase hex digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub u64);

impl SlotId {
	/// The slot allocated when there are none yet.
	pub const FIRST: Self = Self(1);

	/// Parse a slot folder name.
	///
	/// Returns `None` for anything that isn't purely hex, so unrelated entries can be ignored.
	pub fn from_folder_name(name: &str) -> Option<Self> {
		parse_hex_u64(name).map(Self)
	}

	/// The following slot, if there is one.
	pub fn checked_next(self) -> Option<Self> {
		self.0.checked_add(1).map(Self)
	}

	/// The id as little-endian bytes, as it's stored on disk.
	pub fn to_le_bytes(self) -> [u8; 8] {
		self.0.to_le_bytes()
	}
}

impl fmt::Display for SlotId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:016x}", self.0)
	}
}

impl FromStr for SlotId {
	type Err = ParseIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_folder_name(s).ok_or_else(|| ParseIdError::new("slot id", s))
	}
}

/// User account identifier, as 16 raw bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub [u8; 16]);

impl UserId {
	/// The user id of the default Ryujinx profile, `00000000000000010000000000000000`.
	pub const DEFAULT: Self = Self([0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0]);
}

impl Default for UserId {
	fn default() -> Self {
		Self::DEFAULT
	}
}

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
	}
}

impl FromStr for UserId {
	type Err = ParseIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || ParseIdError::new("user id", s);
		if s.len() != 32 || !s.is_ascii() {
			return Err(err());
		}

		let mut bytes = [0; 16];
		for (byte, pair) in bytes.iter_mut().zip(s.as_bytes().chunks(2)) {
			let pair = std::str::from_utf8(pair).map_err(|_| err())?;
			if !pair.bytes().all(|b| b.is_ascii_hexdigit()) {
				return Err(err());
			}
			*byte = u8::from_str_radix(pair, 16).map_err(|_| err())?;
		}

		Ok(Self(bytes))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn title_from_checkpoint_folder() {
		assert_eq!(
			TitleId::from_folder_name("0x0100A2C801C6E000 Some Game"),
			Some((TitleId(0x0100a2c801c6e000), "Some Game"))
		);
		assert_eq!(
			TitleId::from_folder_name("0x01006F8002326000 Animal Crossing: New Horizons"),
			Some((TitleId(0x01006f8002326000), "Animal Crossing: New Horizons"))
		);
	}

	#[test]
	fn title_folder_without_name() {
		assert_eq!(
			TitleId::from_folder_name("0x0100a2c801c6e000"),
			Some((TitleId(0x0100a2c801c6e000), ""))
		);
	}

	#[test]
	fn title_folder_rejects() {
		for name in [
			"",
			"Some Game",
			"0x Some Game",
			"0100a2c801c6e000 Some Game",
			"0xnothex Some Game",
			"0x+100 Some Game",
			"0x10000000000000000 Too Long",
		] {
			assert_eq!(TitleId::from_folder_name(name), None, "{name:?}");
		}
	}

	#[test]
	fn ids_render_as_padded_lowercase_hex() {
		assert_eq!(TitleId(0x0100A2C801C6E000).to_string(), "0100a2c801c6e000");
		assert_eq!(SlotId(1).to_string(), "0000000000000001");
		assert_eq!(SlotId(0xabc).to_string(), "0000000000000abc");
	}

	#[test]
	fn slot_folder_names() {
		assert_eq!(SlotId::from_folder_name("0000000000000003"), Some(SlotId(3)));
		assert_eq!(SlotId::from_folder_name("A"), Some(SlotId(10)));
		assert_eq!(SlotId::from_folder_name("ExtraData0"), None);
		assert_eq!(SlotId::from_folder_name("+1"), None);
		assert_eq!(SlotId::from_folder_name(""), None);
		assert_eq!(SlotId(u64::MAX).checked_next(), None);
	}

	#[test]
	fn user_id_round_trips_through_hex() {
		let user: UserId = "00000000000000010000000000000000".parse().expect("valid");
		assert_eq!(user, UserId::DEFAULT);
		assert_eq!(user.to_string(), "00000000000000010000000000000000");

		let user: UserId = "0123456789ABCDEF0123456789abcdef".parse().expect("valid");
		assert_eq!(user.0[0], 0x01);
		assert_eq!(user.0[15], 0xef);
	}

	#[test]
	fn user_id_rejects() {
		assert!("0001".parse::<UserId>().is_err());
		assert!("0000000000000001000000000000000g".parse::<UserId>().is_err());
		assert!("+0000000000000010000000000000000".parse::<UserId>().is_err());
	}
}

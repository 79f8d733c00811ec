//! The save data index: which slot holds which title, kept in an IMKVDB archive.
//!
//! Two shapes of entries live in the index. Title entries are keyed on the title id and point to
//! the slot holding its save. System entries are keyed on the slot id itself; they're only ever
//! written when building a fresh index from the system save folders already on disk. The two
//! shapes differ (title values have an extra marker byte) and are kept exactly as they are.

use imkvdb::Archive;
use tracing::{debug, instrument, warn};

use crate::{
	error::Result,
	ids::{SlotId, TitleId},
};

/// Length of keys and values in the index.
pub const ENTRY_LENGTH: usize = 64;

/// Key of a title entry.
pub fn title_key(title: TitleId) -> [u8; ENTRY_LENGTH] {
	let mut key = [0; ENTRY_LENGTH];
	key[0..8].copy_from_slice(&title.to_le_bytes());
	key[8] = 1;
	key[32] = 1;
	key
}

/// Value of a title entry.
pub fn title_value(slot: SlotId) -> [u8; ENTRY_LENGTH] {
	let mut value = [0; ENTRY_LENGTH];
	value[0..8].copy_from_slice(&slot.to_le_bytes());
	value[24] = 1;
	value
}

/// Key of a system entry.
pub fn system_key(slot: SlotId) -> [u8; ENTRY_LENGTH] {
	let mut key = [0; ENTRY_LENGTH];
	key[24..32].copy_from_slice(&slot.to_le_bytes());
	key
}

/// Value of a system entry.
pub fn system_value(slot: SlotId) -> [u8; ENTRY_LENGTH] {
	let mut value = [0; ENTRY_LENGTH];
	value[0..8].copy_from_slice(&slot.to_le_bytes());
	value
}

/// Add a title entry unless the title already has one.
///
/// Returns whether the archive changed. An existing entry is left alone even if it points to a
/// different slot.
pub fn upsert_title_binding(archive: &mut Archive, title: TitleId, slot: SlotId) -> bool {
	archive.insert_new(title_key(title).to_vec(), title_value(slot).to_vec())
}

/// Add a system entry unless the slot already has one.
///
/// Returns whether the archive changed.
pub fn upsert_system_binding(archive: &mut Archive, slot: SlotId) -> bool {
	archive.insert_new(system_key(slot).to_vec(), system_value(slot).to_vec())
}

/// An index entry, interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
	/// Title entry.
	Title {
		/// Title id from the key.
		title: TitleId,
		/// Slot id from the value.
		slot: SlotId,
	},

	/// System entry.
	System {
		/// Slot id from the key.
		slot: SlotId,
	},

	/// Entry of some other shape.
	Other {
		/// Key length in bytes.
		key_length: usize,
		/// Value length in bytes.
		value_length: usize,
	},
}

impl Binding {
	/// Interpret an entry.
	pub fn from_entry(key: &[u8], value: &[u8]) -> Self {
		let other = Self::Other {
			key_length: key.len(),
			value_length: value.len(),
		};

		let (Some(key_head), Some(value_head)) = (read_u64(key, 0), read_u64(value, 0)) else {
			return other;
		};

		let title = TitleId(key_head);
		let slot = SlotId(value_head);
		if key == title_key(title) && value == title_value(slot) {
			return Self::Title { title, slot };
		}

		if read_u64(key, 24).map(SlotId) == Some(slot)
			&& key == system_key(slot)
			&& value == system_value(slot)
		{
			return Self::System { slot };
		}

		other
	}
}

fn read_u64(bytes: &[u8], offset: usize) -> Option<u64> {
	let field: [u8; 8] = bytes.get(offset..offset + 8)?.try_into().ok()?;
	Some(u64::from_le_bytes(field))
}

/// The index as loaded for a run, tracking whether it needs writing back.
#[derive(Clone, Debug, Default)]
pub struct ArchiveStore {
	archive: Archive,
	fresh: bool,
	changed: bool,
}

impl ArchiveStore {
	/// Load the index from its bytes, failing if they're malformed.
	pub fn try_load(bytes: Option<&[u8]>) -> imkvdb::Result<Self> {
		match bytes {
			None => Ok(Self::empty()),
			Some(bytes) => Archive::from_bytes(bytes).map(|archive| Self {
				archive,
				fresh: false,
				changed: false,
			}),
		}
	}

	/// Load the index from its bytes.
	///
	/// Missing or malformed input gives an empty index; this never fails.
	#[instrument(level = "debug", skip(bytes), fields(length = ?bytes.map(<[u8]>::len)))]
	pub fn load(bytes: Option<&[u8]>) -> Self {
		match Self::try_load(bytes) {
			Ok(store) => {
				debug!(entries=%store.archive.len(), fresh=%store.fresh, "loaded save index");
				store
			}
			Err(err) => {
				warn!(%err, "save index is malformed, starting from empty");
				Self::empty()
			}
		}
	}

	fn empty() -> Self {
		Self {
			archive: Archive::new(),
			fresh: true,
			changed: false,
		}
	}

	/// Whether this started empty because there was no usable index.
	pub fn is_fresh(&self) -> bool {
		self.fresh
	}

	/// Whether there are changes not yet written.
	pub fn is_changed(&self) -> bool {
		self.changed
	}

	/// The archive.
	pub fn archive(&self) -> &Archive {
		&self.archive
	}

	/// Record that a title is held in a slot, if it isn't already recorded.
	#[instrument(level = "debug", skip(self))]
	pub fn upsert_title_binding(&mut self, title: TitleId, slot: SlotId) -> bool {
		let added = upsert_title_binding(&mut self.archive, title, slot);
		self.changed |= added;
		debug!(%added, "title binding");
		added
	}

	/// Record a system save slot, if it isn't already recorded.
	#[instrument(level = "debug", skip(self))]
	pub fn upsert_system_binding(&mut self, slot: SlotId) -> bool {
		let added = upsert_system_binding(&mut self.archive, slot);
		self.changed |= added;
		debug!(%added, "system binding");
		added
	}

	/// Record system save slots from the names of the system save folders.
	///
	/// Names that aren't slot ids are ignored, the rest are added in ascending order. Returns how
	/// many were added.
	pub fn seed_system_bindings<I, S>(&mut self, names: I) -> usize
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut slots: Vec<SlotId> = names
			.into_iter()
			.filter_map(|name| SlotId::from_folder_name(name.as_ref()))
			.collect();
		slots.sort_unstable();
		slots
			.into_iter()
			.filter(|&slot| self.upsert_system_binding(slot))
			.count()
	}

	/// Interpret every entry, in order.
	pub fn bindings(&self) -> impl Iterator<Item = Binding> + '_ {
		self.archive
			.iter()
			.map(|(key, value)| Binding::from_entry(key, value))
	}

	/// Encode the index.
	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		Ok(self.archive.to_bytes()?)
	}

	/// Mark the current state as written.
	pub fn mark_saved(&mut self) {
		self.changed = false;
		self.fresh = false;
	}
}

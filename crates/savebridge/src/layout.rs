//! Where things live in a Ryujinx data directory.

use std::path::{Path, PathBuf};

use crate::{extra_data::EXTRA_DATA_FILENAME, ids::SlotId};

/// System save holding the save data index.
pub const SAVE_INDEX_ID: &str = "8000000000000000";

/// File name of the save data index.
pub const ARCHIVE_FILENAME: &str = "imkvdb.arc";

/// Name of the payload folder inside a slot.
pub const PAYLOAD_DIRNAME: &str = "0";

/// Paths to the parts of the destination the importer touches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
	/// Folder holding user save slots.
	pub user_saves: PathBuf,

	/// Folder holding system save slots.
	pub system_saves: PathBuf,

	/// The save data index file.
	pub archive: PathBuf,
}

impl Layout {
	/// The standard layout under a Ryujinx data directory.
	///
	/// ```
	/// # use std::path::Path;
	/// # use savebridge::layout::Layout;
	/// let layout = Layout::ryujinx(Path::new("/home/me/.config/Ryujinx"));
	/// assert_eq!(layout.user_saves, Path::new("/home/me/.config/Ryujinx/bis/user/save"));
	/// assert_eq!(
	/// 	layout.archive,
	/// 	Path::new("/home/me/.config/Ryujinx/bis/system/save/8000000000000000/0/imkvdb.arc"),
	/// );
	/// ```
	pub fn ryujinx(root: &Path) -> Self {
		let system_saves = root.join("bis").join("system").join("save");
		Self {
			user_saves: root.join("bis").join("user").join("save"),
			archive: system_saves
				.join(SAVE_INDEX_ID)
				.join(PAYLOAD_DIRNAME)
				.join(ARCHIVE_FILENAME),
			system_saves,
		}
	}

	/// Folder of a user save slot.
	pub fn slot_dir(&self, slot: SlotId) -> PathBuf {
		self.user_saves.join(slot.to_string())
	}

	/// Metadata record of a user save slot.
	pub fn extra_data(&self, slot: SlotId) -> PathBuf {
		self.slot_dir(slot).join(EXTRA_DATA_FILENAME)
	}

	/// Payload folder of a user save slot.
	pub fn payload_dir(&self, slot: SlotId) -> PathBuf {
		self.slot_dir(slot).join(PAYLOAD_DIRNAME)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn slot_paths() {
		let layout = Layout::ryujinx(Path::new("root"));
		assert_eq!(
			layout.extra_data(SlotId(1)),
			Path::new("root/bis/user/save/0000000000000001/ExtraData0")
		);
		assert_eq!(
			layout.payload_dir(SlotId(0x1f)),
			Path::new("root/bis/user/save/000000000000001f/0")
		);
		assert_eq!(layout.system_saves, Path::new("root/bis/system/save"));
	}
}

//! Importing Checkpoint backups into Ryujinx save slots.
//!
//! A Checkpoint backup directory holds one folder per title, named `0x<title id> <name>`, and
//! inside each, one folder per backup. For every title, the [`Importer`]:
//!
//! 1. finds the slot already holding that title, by reading each slot's `ExtraData0`;
//! 2. or allocates a new slot and writes its `ExtraData0`;
//! 3. copies the most recent backup into the slot's payload folder;
//! 4. records the title in the save data index.
//!
//! The index is read once when the importer is opened and written once at the end of a
//! [`run()`](Importer::run), if anything changed.

use std::{
	ffi::OsStr,
	path::{Path, PathBuf},
	time::SystemTime,
};

use regex::Regex;
use tracing::{debug, info, instrument, trace, warn};

use crate::{
	error::{Error, IoContext, Result},
	extra_data::{self, ExtraDataDefaults, EXTRA_DATA_FILENAME},
	ids::{SlotId, TitleId},
	layout::{Layout, PAYLOAD_DIRNAME},
	slots::{find_slot, next_slot},
	storage::Storage,
	store::ArchiveStore,
};

/// Import configuration.
#[derive(Clone, Debug, Default)]
pub struct ImportOptions {
	/// Values for new `ExtraData0` records.
	pub defaults: ExtraDataDefaults,

	/// Only import title folders whose name matches.
	pub filter: Option<Regex>,
}

/// A title that was imported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Imported {
	/// Source folder name.
	pub folder: String,

	/// Title id.
	pub title: TitleId,

	/// Title name, from the folder name.
	pub name: String,

	/// Slot the save went into.
	pub slot: SlotId,

	/// Whether the slot was created for this import.
	pub new_slot: bool,

	/// Backup folder that was copied, if the title had any.
	pub backup: Option<PathBuf>,

	/// Number of files copied.
	pub files: u64,

	/// Whether the title was newly recorded in the save data index.
	pub bound: bool,
}

/// Why a source folder was passed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
	/// Not a directory.
	NotADirectory,

	/// Folder name isn't `0x<hex> <name>`.
	NoTitleId,

	/// Excluded by [`ImportOptions::filter`].
	FilteredOut,
}

/// What happened to one source folder.
#[derive(Debug)]
pub enum TitleReport {
	/// Imported.
	Imported(Imported),

	/// Passed over.
	Skipped {
		/// Source folder name.
		folder: String,
		/// Why.
		reason: SkipReason,
	},

	/// Failed partway; other titles are unaffected.
	Failed {
		/// Source folder name.
		folder: String,
		/// What went wrong.
		error: Error,
	},
}

/// Importer context.
#[derive(Debug)]
pub struct Importer<S> {
	storage: S,
	layout: Layout,
	options: ImportOptions,
	store: ArchiveStore,
}

impl<S: Storage> Importer<S> {
	/// Prepare to import into a destination.
	///
	/// This loads the save data index. If there isn't one (or it can't be read), a new one is
	/// started with an entry for every existing system save.
	#[instrument(level = "debug", skip(storage, options))]
	pub fn open(storage: S, layout: Layout, options: ImportOptions) -> Result<Self> {
		let bytes = storage
			.read(&layout.archive)
			.context("read save data index", &layout.archive)?;
		let mut store = ArchiveStore::load(bytes.as_deref());

		if store.is_fresh() {
			let names = list_dir_names(&storage, &layout.system_saves)?;
			let seeded = store.seed_system_bindings(names);
			info!(%seeded, "started a new save data index from system saves");
		}

		Ok(Self {
			storage,
			layout,
			options,
			store,
		})
	}

	/// The save data index as it currently stands.
	pub fn store(&self) -> &ArchiveStore {
		&self.store
	}

	/// Import every title folder in a Checkpoint directory.
	///
	/// Titles are processed in name order. A title that fails is reported and the rest carry on;
	/// only failing to list the source or the destination, or to write the index, stops the run.
	#[instrument(level = "debug", skip(self))]
	pub fn run(&mut self, source: &Path) -> Result<Vec<TitleReport>> {
		let entries = self
			.storage
			.list_dir(source)
			.context("list source directory", source)?;

		let mut reports = Vec::with_capacity(entries.len());
		for entry in entries {
			let folder = entry.name.to_string_lossy().into_owned();
			let skip = if !entry.is_dir {
				Some(SkipReason::NotADirectory)
			} else {
				self.skip_reason(&folder)
			};
			if let Some(reason) = skip {
				trace!(%folder, ?reason, "skip");
				reports.push(TitleReport::Skipped { folder, reason });
				continue;
			}

			reports.push(match self.import_title(&source.join(&entry.name)) {
				Ok(Some(imported)) => TitleReport::Imported(imported),
				Ok(None) => TitleReport::Skipped {
					folder,
					reason: SkipReason::NoTitleId,
				},
				Err(error) if self.is_base_dir_error(&error) => return Err(error),
				Err(error) => {
					warn!(%folder, %error, "title failed");
					TitleReport::Failed { folder, error }
				}
			});
		}

		self.flush()?;
		Ok(reports)
	}

	fn is_base_dir_error(&self, error: &Error) -> bool {
		matches!(error, Error::Io { path, .. } if *path == self.layout.user_saves)
	}

	/// Import one Checkpoint title folder.
	///
	/// Returns `Ok(None)` if the folder isn't for a title or is filtered out; see
	/// [`skip_reason()`](Self::skip_reason). The index is updated in memory but not written:
	/// call [`flush()`](Self::flush) afterwards.
	#[instrument(level = "debug", skip(self))]
	pub fn import_title(&mut self, folder: &Path) -> Result<Option<Imported>> {
		let Some(folder_name) = folder.file_name().and_then(OsStr::to_str) else {
			debug!("folder name is not unicode");
			return Ok(None);
		};

		if let Some(reason) = self.skip_reason(folder_name) {
			debug!(?reason, "skip folder");
			return Ok(None);
		}

		let Some((title, name)) = TitleId::from_folder_name(folder_name) else {
			return Ok(None);
		};
		info!(%title, %name, "import title");

		let (slot, slot_dir, new_slot) = match self.find_existing_slot(title)? {
			Some((slot, dir)) => {
				debug!(%slot, ?dir, "title already has a slot");
				(slot, dir, false)
			}
			None => {
				let slot = self.create_slot(title)?;
				(slot, self.layout.slot_dir(slot), true)
			}
		};

		let payload = slot_dir.join(PAYLOAD_DIRNAME);
		self.storage
			.create_dir_all(&payload)
			.context("create slot payload folder", &payload)?;

		let backup = self.latest_backup(folder)?;
		let files = if let Some(backup) = &backup {
			info!(?backup, %slot, "copy backup");
			self.storage
				.copy_tree(backup, &payload)
				.context("copy backup from", backup)?
		} else {
			warn!(%title, "title has no backups");
			0
		};

		let bound = self.store.upsert_title_binding(title, slot);

		Ok(Some(Imported {
			folder: folder_name.into(),
			title,
			name: name.into(),
			slot,
			new_slot,
			backup,
			files,
			bound,
		}))
	}

	/// Why a folder of this name would not be imported, if it wouldn't.
	pub fn skip_reason(&self, folder_name: &str) -> Option<SkipReason> {
		if TitleId::from_folder_name(folder_name).is_none() {
			Some(SkipReason::NoTitleId)
		} else if self
			.options
			.filter
			.as_ref()
			.map_or(false, |filter| !filter.is_match(folder_name))
		{
			Some(SkipReason::FilteredOut)
		} else {
			None
		}
	}

	/// Write the save data index, if it changed.
	///
	/// Returns whether it was written.
	#[instrument(level = "debug", skip(self))]
	pub fn flush(&mut self) -> Result<bool> {
		if !self.store.is_changed() {
			debug!("save data index unchanged");
			return Ok(false);
		}

		let bytes = self.store.to_bytes()?;
		if let Some(parent) = self.layout.archive.parent() {
			self.storage
				.create_dir_all(parent)
				.context("create save data index folder", parent)?;
		}
		self.storage
			.write(&self.layout.archive, &bytes)
			.context("write save data index", &self.layout.archive)?;
		self.store.mark_saved();

		info!(entries=%self.store.archive().len(), "wrote save data index");
		Ok(true)
	}

	/// Existing user save slots, in name order.
	fn slots(&self) -> Result<Vec<String>> {
		if !self.storage.is_dir(&self.layout.user_saves) {
			return Ok(Vec::new());
		}

		list_dir_names(&self.storage, &self.layout.user_saves)
	}

	/// Find the slot whose `ExtraData0` is for this title, and the folder it's in.
	///
	/// Slot folders are used under the name they're listed as, which may not be the canonical
	/// rendering of the slot id. The listing and records are read afresh every time. Records that
	/// can't be read are skipped over.
	fn find_existing_slot(&self, title: TitleId) -> Result<Option<(SlotId, PathBuf)>> {
		let slots = self.slots()?;
		let records = slots
			.iter()
			.filter_map(|name| {
				let slot = SlotId::from_folder_name(name)?;
				Some((slot, self.layout.user_saves.join(name)))
			})
			.filter_map(|(slot, dir)| {
				let path = dir.join(EXTRA_DATA_FILENAME);
				match self.storage.read(&path) {
					Ok(record) => record.map(|bytes| ((slot, dir), bytes)),
					Err(err) => {
						warn!(?path, %err, "could not read slot record, skipping");
						None
					}
				}
			});

		Ok(find_slot(title, records))
	}

	/// Allocate and create a new slot for a title.
	fn create_slot(&self, title: TitleId) -> Result<SlotId> {
		let slot = next_slot(self.slots()?)?;
		info!(%slot, %title, "create new slot");

		let dir = self.layout.slot_dir(slot);
		self.storage
			.create_dir_all(&dir)
			.context("create slot folder", &dir)?;

		let record = extra_data::encode(title, &self.options.defaults)?;
		let path = self.layout.extra_data(slot);
		self.storage
			.write(&path, &record)
			.context("write slot record", &path)?;

		Ok(slot)
	}

	/// The most recently modified backup folder within a title folder.
	///
	/// On a tie, the first in name order wins.
	fn latest_backup(&self, folder: &Path) -> Result<Option<PathBuf>> {
		let entries = self
			.storage
			.list_dir(folder)
			.context("list title folder", folder)?;

		let mut latest: Option<(SystemTime, PathBuf)> = None;
		for entry in entries.into_iter().filter(|entry| entry.is_dir) {
			let path = folder.join(&entry.name);
			let modified = self
				.storage
				.modified(&path)
				.context("read modification time of", &path)?;
			trace!(?path, ?modified, "backup");

			if latest.as_ref().map_or(true, |(time, _)| modified > *time) {
				latest = Some((modified, path));
			}
		}

		Ok(latest.map(|(_, path)| path))
	}
}

/// Names of the subdirectories of a directory, skipping non-unicode names.
///
/// A missing directory has no subdirectories.
fn list_dir_names<S: Storage>(storage: &S, path: &Path) -> Result<Vec<String>> {
	if !storage.is_dir(path) {
		return Ok(Vec::new());
	}

	Ok(storage
		.list_dir(path)
		.context("list directory", path)?
		.into_iter()
		.filter(|entry| entry.is_dir)
		.filter_map(|entry| entry.name.into_string().ok())
		.collect())
}

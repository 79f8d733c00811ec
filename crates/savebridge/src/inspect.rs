//! Reading back what's in a Ryujinx destination: the save data index and the slot records.

use tracing::{instrument, warn};

use crate::{
	error::{IoContext, Result},
	extra_data::{ExtraData, EXTRA_DATA_FILENAME},
	ids::SlotId,
	layout::Layout,
	storage::Storage,
	store::{ArchiveStore, Binding},
};

/// State of the save data index.
#[derive(Debug)]
pub enum IndexState {
	/// There's no index file.
	Missing,

	/// The index file can't be decoded.
	Malformed(imkvdb::Error),

	/// The index, interpreted.
	Loaded(Vec<Binding>),
}

/// A user save slot and its record.
#[derive(Debug)]
pub struct SlotSummary {
	/// Slot id.
	pub slot: SlotId,

	/// The slot's `ExtraData0`, if it has a readable one.
	pub record: Option<ExtraData>,
}

/// Everything the importer cares about in a destination.
#[derive(Debug)]
pub struct Inspection {
	/// The save data index.
	pub index: IndexState,

	/// User save slots, in name order.
	pub slots: Vec<SlotSummary>,
}

/// Read the index and slot records of a destination.
#[instrument(level = "debug", skip(storage))]
pub fn inspect<S: Storage>(storage: &S, layout: &Layout) -> Result<Inspection> {
	let index = match storage
		.read(&layout.archive)
		.context("read save data index", &layout.archive)?
	{
		None => IndexState::Missing,
		Some(bytes) => match ArchiveStore::try_load(Some(bytes.as_slice())) {
			Ok(store) => IndexState::Loaded(store.bindings().collect()),
			Err(err) => IndexState::Malformed(err),
		},
	};

	let mut slots = Vec::new();
	if storage.is_dir(&layout.user_saves) {
		for entry in storage
			.list_dir(&layout.user_saves)
			.context("list directory", &layout.user_saves)?
		{
			let Some(slot) = entry
				.name_str()
				.filter(|_| entry.is_dir)
				.and_then(SlotId::from_folder_name)
			else {
				continue;
			};

			let path = layout
				.user_saves
				.join(&entry.name)
				.join(EXTRA_DATA_FILENAME);
			let record = match storage.read(&path) {
				Ok(Some(bytes)) => ExtraData::parse(&bytes)
					.map_err(|err| warn!(?path, %err, "unreadable slot record"))
					.ok(),
				Ok(None) => None,
				Err(err) => {
					warn!(?path, %err, "could not read slot record");
					None
				}
			};

			slots.push(SlotSummary { slot, record });
		}
	}

	Ok(Inspection { index, slots })
}

//! Choosing the save slot for a title: reuse the one already holding it, or allocate the next.

use std::fmt;

use tracing::trace;

use crate::{
	error::{Error, Result},
	extra_data::title_id_of,
	ids::{SlotId, TitleId},
};

/// The next unused slot, given the names of the existing slot folders.
///
/// Names that aren't hex are not slots and are ignored. With no slots at all, this is
/// [`SlotId::FIRST`]; otherwise it's one past the highest. Gaps are never filled.
pub fn next_slot<I, S>(names: I) -> Result<SlotId>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	match names
		.into_iter()
		.filter_map(|name| SlotId::from_folder_name(name.as_ref()))
		.max()
	{
		None => Ok(SlotId::FIRST),
		Some(highest) => highest
			.checked_next()
			.ok_or(Error::SlotsExhausted(highest)),
	}
}

/// Find the slot whose `ExtraData0` record is for this title.
///
/// Slots are checked in the order given, and the first match wins. Records too short to hold a
/// title id never match. The slot can be anything identifying it to the caller, such as a
/// [`SlotId`] or a [`SlotId`] and its folder.
pub fn find_slot<I, K, B>(title: TitleId, slots: I) -> Option<K>
where
	I: IntoIterator<Item = (K, B)>,
	K: fmt::Debug,
	B: AsRef<[u8]>,
{
	slots.into_iter().find_map(|(slot, record)| {
		let found = title_id_of(record.as_ref());
		trace!(?slot, ?found, "check slot");
		(found == Some(title)).then_some(slot)
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::extra_data::{encode, ExtraDataDefaults};

	#[test]
	fn first_slot_when_none_exist() {
		let slot = next_slot(Vec::<String>::new()).expect("not exhausted");
		assert_eq!(slot.to_string(), "0000000000000001");
	}

	#[test]
	fn one_past_the_highest() {
		let slot = next_slot(["0000000000000001", "0000000000000003"]).expect("not exhausted");
		assert_eq!(slot.to_string(), "0000000000000004");
	}

	#[test]
	fn ignores_unrelated_names() {
		let slot = next_slot(["0000000000000002", "lost+found", ".DS_Store", "", "+ff"])
			.expect("not exhausted");
		assert_eq!(slot, SlotId(3));

		let slot = next_slot(["not-a-slot"]).expect("not exhausted");
		assert_eq!(slot, SlotId::FIRST);
	}

	#[test]
	fn exhausted() {
		assert!(matches!(
			next_slot(["ffffffffffffffff"]),
			Err(Error::SlotsExhausted(SlotId(u64::MAX)))
		));
	}

	#[test]
	fn finds_matching_record() {
		let defaults = ExtraDataDefaults::default();
		let slots = vec![
			(SlotId(1), encode(TitleId(0xAAAA), &defaults).expect("encodes")),
			(SlotId(2), encode(TitleId(0xBBBB), &defaults).expect("encodes")),
		];
		assert_eq!(find_slot(TitleId(0xBBBB), slots.clone()), Some(SlotId(2)));
		assert_eq!(find_slot(TitleId(0xCCCC), slots), None);
	}

	#[test]
	fn first_match_in_order_wins() {
		let record = encode(TitleId(0xAAAA), &ExtraDataDefaults::default()).expect("encodes");
		let slots = [(SlotId(5), &record[..]), (SlotId(2), &record[..])];
		assert_eq!(find_slot(TitleId(0xAAAA), slots), Some(SlotId(5)));
	}

	#[test]
	fn short_records_never_match() {
		let slots = [(SlotId(1), vec![0; 4]), (SlotId(2), vec![])];
		assert_eq!(find_slot(TitleId(0), slots), None);
	}
}

use std::path::PathBuf;

use clap::{Parser, ValueHint};
use savebridge::{
	inspect::{inspect, IndexState},
	storage::LocalStorage,
	store::Binding,
};
use tracing::info;

use crate::import::LayoutArgs;

#[derive(Debug, Clone, Parser)]
pub struct InspectArgs {
	/// Ryujinx data directory.
	#[arg(
		short,
		long,
		value_hint = ValueHint::DirPath,
		value_name = "DIR",
	)]
	pub ryujinx: PathBuf,

	#[command(flatten)]
	pub layout: LayoutArgs,
}

pub(crate) fn inspect_cmd(args: InspectArgs) -> miette::Result<()> {
	if !args.ryujinx.is_dir() {
		return Err(savebridge::error::Error::MissingDirectory(args.ryujinx).into());
	}

	let layout = args.layout.layout(&args.ryujinx);
	info!(?layout, "inspect destination");
	let inspection = inspect(&LocalStorage, &layout)?;

	println!("save data index: {}", layout.archive.display());
	match inspection.index {
		IndexState::Missing => println!("  (missing)"),
		IndexState::Malformed(err) => {
			println!("  (malformed)");
			eprintln!("{:?}", miette::Report::new(err));
		}
		IndexState::Loaded(bindings) => {
			for binding in bindings {
				match binding {
					Binding::Title { title, slot } => println!("  title {title} -> slot {slot}"),
					Binding::System { slot } => println!("  system slot {slot}"),
					Binding::Other {
						key_length,
						value_length,
					} => println!("  other entry ({key_length}-byte key, {value_length}-byte value)"),
				}
			}
		}
	}

	println!("user save slots: {}", layout.user_saves.display());
	for summary in inspection.slots {
		match summary.record {
			Some(record) => println!(
				"  {} title {} user {}{}",
				summary.slot,
				record.title(),
				record.user(),
				if record.is_consistent() {
					""
				} else {
					" (title ids disagree)"
				},
			),
			None => println!("  {} (no readable ExtraData0)", summary.slot),
		}
	}

	Ok(())
}

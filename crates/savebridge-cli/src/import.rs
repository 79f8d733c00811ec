use std::path::{Path, PathBuf};

use clap::{Args, Parser, ValueHint};
use regex::Regex;
use savebridge::{
	error::Error,
	extra_data::ExtraDataDefaults,
	ids::UserId,
	import::{ImportOptions, Importer, TitleReport},
	layout::Layout,
	storage::{DryRun, LocalStorage, Storage},
};
use tracing::{debug, info};

#[derive(Debug, Clone, Parser)]
pub struct ImportArgs {
	/// Checkpoint save directory.
	///
	/// This contains one folder per title, named like '0x0100A2C801C6E000 Some Game', each
	/// holding one folder per backup. The most recent backup of each title is imported.
	#[arg(
		short,
		long,
		value_hint = ValueHint::DirPath,
		value_name = "DIR",
	)]
	pub checkpoint: PathBuf,

	/// Ryujinx data directory.
	///
	/// This is the folder containing 'bis', e.g. '~/.config/Ryujinx' on Linux or
	/// '%APPDATA%\Ryujinx' on Windows.
	#[arg(
		short,
		long,
		value_hint = ValueHint::DirPath,
		value_name = "DIR",
	)]
	pub ryujinx: PathBuf,

	#[command(flatten)]
	pub layout: LayoutArgs,

	/// User to own newly created saves.
	///
	/// As 32 hex digits. The default is the user of the default Ryujinx profile.
	#[arg(long, value_name = "HEX", default_value_t = UserId::DEFAULT)]
	pub user_id: UserId,

	/// Only import titles whose folder name matches.
	#[arg(long, value_name = "REGEX")]
	pub filter: Option<Regex>,

	/// Show what would be done, without writing anything.
	#[arg(long)]
	pub dry_run: bool,
}

/// Overrides for where things are under the Ryujinx directory.
#[derive(Debug, Clone, Args)]
pub struct LayoutArgs {
	/// Folder holding user save slots, instead of 'bis/user/save'.
	#[arg(long, value_hint = ValueHint::DirPath, value_name = "DIR")]
	pub user_saves: Option<PathBuf>,

	/// Folder holding system save slots, instead of 'bis/system/save'.
	#[arg(long, value_hint = ValueHint::DirPath, value_name = "DIR")]
	pub system_saves: Option<PathBuf>,

	/// Save data index file, instead of 'bis/system/save/8000000000000000/0/imkvdb.arc'.
	#[arg(long, value_hint = ValueHint::FilePath, value_name = "PATH")]
	pub index: Option<PathBuf>,
}

impl LayoutArgs {
	pub(crate) fn layout(&self, ryujinx: &Path) -> Layout {
		let mut layout = Layout::ryujinx(ryujinx);
		if let Some(path) = &self.user_saves {
			layout.user_saves = path.clone();
		}
		if let Some(path) = &self.system_saves {
			layout.system_saves = path.clone();
		}
		if let Some(path) = &self.index {
			layout.archive = path.clone();
		}
		layout
	}
}

pub(crate) fn import(args: ImportArgs) -> miette::Result<()> {
	for dir in [&args.checkpoint, &args.ryujinx] {
		if !dir.is_dir() {
			return Err(Error::MissingDirectory(dir.clone()).into());
		}
	}

	let layout = args.layout.layout(&args.ryujinx);
	debug!(?layout, "destination layout");

	let options = ImportOptions {
		defaults: ExtraDataDefaults {
			user_id: args.user_id,
			..Default::default()
		},
		filter: args.filter,
	};

	if args.dry_run {
		info!("dry run: nothing will be written");
		run(DryRun(LocalStorage), layout, options, &args.checkpoint)
	} else {
		run(LocalStorage, layout, options, &args.checkpoint)
	}
}

fn run<S: Storage>(
	storage: S,
	layout: Layout,
	options: ImportOptions,
	checkpoint: &Path,
) -> miette::Result<()> {
	info!("open destination");
	let mut importer = Importer::open(storage, layout, options)?;

	info!(path=?checkpoint, "import titles");
	for report in importer.run(checkpoint)? {
		match report {
			TitleReport::Imported(imported) => match &imported.backup {
				Some(backup) => println!(
					"Imported {} ({}) from {:?} into slot {} [{} files{}]",
					imported.name,
					imported.title,
					backup.file_name().unwrap_or_default(),
					imported.slot,
					imported.files,
					if imported.new_slot { ", new slot" } else { "" },
				),
				None => eprintln!(
					"{} ({}) has no backups, slot {} is empty",
					imported.name, imported.title, imported.slot
				),
			},
			TitleReport::Skipped { folder, reason } => {
				debug!(%folder, ?reason, "skipped");
			}
			TitleReport::Failed { folder, error } => {
				eprintln!("Failed to import {folder}: {:?}", miette::Report::new(error));
			}
		}
	}

	Ok(())
}

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::{import::ImportArgs, inspect::InspectArgs};

/// Move Checkpoint save backups into Ryujinx.
#[derive(Debug, Clone, Parser)]
#[command(
	name = "savebridge",
	bin_name = "savebridge",
	author,
	version,
	after_help = "Want more detail? Try the long '--help' flag!",
	after_long_help = "Didn't expect this much output? Use the short '-h' flag to get short help."
)]
#[cfg_attr(debug_assertions, command(before_help = "⚠ DEBUG BUILD ⚠"))]
pub struct Args {
	/// Set diagnostic log level.
	///
	/// This enables diagnostic logging, which is useful for investigating bugs. Use multiple
	/// times to increase verbosity.
	///
	/// You may want to use with '--log-file' to avoid polluting your terminal.
	///
	/// Setting $RUST_LOG also works, and takes precedence, but is not recommended unless you know
	/// what you're doing.
	#[arg(
		long,
		short,
		action = clap::ArgAction::Count,
		num_args = 0,
		global = true,
	)]
	pub verbose: Option<u8>,

	/// Write diagnostic logs to a file.
	///
	/// This writes diagnostic logs to a file, instead of the terminal, in JSON format. If a log
	/// level was not already specified, this will set it to '-vvv'.
	///
	/// If a path is not provided, the default is the working directory. Note that with
	/// '--log-file' the path is required. If the path is a directory, the file is created with a
	/// timestamped name.
	#[arg(
		long,
		num_args = 0..=1,
		default_missing_value = ".",
		value_hint = ValueHint::AnyPath,
		value_name = "PATH",
		global = true,
	)]
	pub log_file: Option<PathBuf>,

	/// What to do.
	#[command(subcommand)]
	pub action: Action,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Action {
	/// Import Checkpoint backups into Ryujinx.
	Import(ImportArgs),

	/// Show the Ryujinx save data index and save slots.
	Inspect(InspectArgs),
}

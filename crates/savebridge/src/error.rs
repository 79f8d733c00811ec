//! Error type for the import machinery.

use std::path::{Path, PathBuf};

use deku::DekuError;
use miette::Diagnostic;
use thiserror::Error;

use crate::ids::SlotId;

/// Convenience return type.
pub type Result<T> = std::result::Result<T, Error>;

/// Combined error type.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
	/// I/O error, with what was being done and to which path.
	#[error("could not {action} {}", path.display())]
	Io {
		/// What was being attempted, as a verb phrase.
		action: &'static str,

		/// Path involved.
		path: PathBuf,

		/// Underlying error.
		#[source]
		source: std::io::Error,
	},

	/// A base directory is missing.
	#[error("{} does not exist or is not a directory", .0.display())]
	#[diagnostic(help("check the path given on the command line"))]
	MissingDirectory(PathBuf),

	/// Archive encoding error.
	#[error(transparent)]
	#[diagnostic(transparent)]
	Archive(#[from] imkvdb::Error),

	/// ExtraData record (de)serialisation error.
	#[error("extra data: {0}")]
	ExtraData(#[from] DekuError),

	/// ExtraData record is shorter than the fixed length.
	#[error("extra data is {0} bytes, expected {}", crate::extra_data::EXTRA_DATA_LENGTH)]
	ShortExtraData(usize),

	/// Every slot identifier is taken.
	#[error("no save slot identifier left after {0}")]
	SlotsExhausted(SlotId),
}

/// Attach an action and path to I/O errors.
pub(crate) trait IoContext<T> {
	fn context(self, action: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
	fn context(self, action: &'static str, path: &Path) -> Result<T> {
		self.map_err(|source| Error::Io {
			action,
			path: path.to_owned(),
			source,
		})
	}
}

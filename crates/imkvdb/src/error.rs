//! Error types for decoding and encoding [`Archive`](crate::Archive)s.
use std::borrow::Cow;

use deku::DekuError;
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Convenience return type.
pub type Result<T> = std::result::Result<T, Error>;

/// Combined error type for archive methods.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
	/// Format error that's just a message.
	#[error(transparent)]
	Simple(#[from] SimpleError),

	/// Format error that includes source.
	#[error(transparent)]
	Source(#[from] SourceError),
}

impl Error {
	/// The kind of error, regardless of whether it carries source.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::Simple(err) => err.kind,
			Error::Source(err) => err.kind,
		}
	}
}

/// Format error.
#[derive(Error, Diagnostic, Debug)]
#[error("imkvdb: {message}")]
pub struct SimpleError {
	/// Error kind.
	pub kind: ErrorKind,

	/// Error message.
	pub message: Cow<'static, str>,
}

/// Format error with a snippet of the archive.
#[derive(Error, Diagnostic, Debug)]
#[error("imkvdb: {message}")]
pub struct SourceError {
	/// Error kind.
	pub kind: ErrorKind,

	/// Error message.
	pub message: Cow<'static, str>,

	/// Error location in the archive.
	#[label("here")]
	pub at: SourceSpan,

	/// Snippet of the archive.
	#[source_code]
	pub snippet: String,
}

impl SimpleError {
	/// New error without source.
	pub fn new(kind: ErrorKind) -> Self {
		Self {
			kind,
			message: kind.default_message(),
		}
	}

	/// New simple error from deku.
	pub fn from_deku(orig: DekuError) -> Self {
		Self::new(ErrorKind::Parse).with_message(orig.to_string())
	}

	/// Change the error message.
	pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
		self.message = message.into();
		self
	}
}

impl SourceError {
	/// New error with source snippet.
	pub fn new(kind: ErrorKind, snippet: &[u8], at_byte: usize) -> Self {
		Self {
			kind,
			message: kind.default_message(),
			snippet: format!("{snippet:02x?}"),
			at: SourceSpan::from((
				// each byte renders as "xx, ", plus one for the opening [
				(at_byte * 4) + 1,
				2,
			)),
		}
	}

	/// New error with source snippet, extracted from a larger source.
	pub fn from_source(kind: ErrorKind, source: &[u8], at_byte: usize, context: usize) -> Self {
		let start = at_byte.saturating_sub(context).min(source.len());
		let end = at_byte.saturating_add(context).min(source.len());
		Self::new(kind, &source[start..end], at_byte.saturating_sub(start))
	}

	/// New error from deku.
	pub fn from_deku(orig: DekuError, source: &[u8], at_byte: usize, context: usize) -> Self {
		Self::from_source(ErrorKind::Parse, source, at_byte, context).with_message(orig.to_string())
	}

	/// Change the error message.
	pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
		self.message = message.into();
		self
	}
}

/// Format error kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// The archive doesn't start with [`ARCHIVE_MAGIC`](crate::constants::ARCHIVE_MAGIC).
	InvalidMagic,

	/// An entry doesn't start with [`ENTRY_MAGIC`](crate::constants::ENTRY_MAGIC).
	InvalidEntryMagic {
		/// Zero-based position of the entry.
		index: u32,
	},

	/// The header declares more entries than could possibly fit in the bytes available.
	CountOverrun {
		/// Entry count declared in the header.
		count: u32,
		/// Bytes available after the header.
		available: usize,
	},

	/// The data ends before a structure is complete.
	Truncated {
		/// Bytes needed to complete the structure.
		needed: usize,
		/// Bytes actually available.
		available: usize,
	},

	/// Two entries have the same key.
	DuplicateKey {
		/// Zero-based position of the second occurrence.
		index: u32,
	},

	/// Something is too large to be described by a 32-bit length.
	TooLarge(&'static str),

	/// Parse error.
	Parse,
}

impl ErrorKind {
	/// Get the default error message for this error kind.
	pub fn default_message(self) -> Cow<'static, str> {
		match self {
			ErrorKind::InvalidMagic => Cow::Borrowed("not an IMKVDB archive (bad magic)"),
			ErrorKind::InvalidEntryMagic { index } => {
				Cow::Owned(format!("entry {index} has a bad magic"))
			}
			ErrorKind::CountOverrun { count, available } => Cow::Owned(format!(
				"header declares {count} entries but only {available} bytes follow"
			)),
			ErrorKind::Truncated { needed, available } => Cow::Owned(format!(
				"truncated: needed {needed} bytes, {available} available"
			)),
			ErrorKind::DuplicateKey { index } => {
				Cow::Owned(format!("entry {index} repeats an earlier key"))
			}
			ErrorKind::TooLarge(what) => Cow::Owned(format!("{what} is too large")),
			ErrorKind::Parse => Cow::Borrowed("parse error"),
		}
	}
}

impl From<ErrorKind> for SimpleError {
	fn from(ek: ErrorKind) -> Self {
		Self::new(ek)
	}
}

impl From<ErrorKind> for Error {
	fn from(ek: ErrorKind) -> Self {
		Self::Simple(ek.into())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn source_snippet_is_clamped() {
		let source = [1, 2, 3, 4];
		let err = SourceError::from_source(ErrorKind::Parse, &source, 2, 10);
		assert_eq!(err.snippet, "[01, 02, 03, 04]");
	}

	#[test]
	fn kind_survives_wrapping() {
		let err: Error = ErrorKind::DuplicateKey { index: 4 }.into();
		assert_eq!(err.kind(), ErrorKind::DuplicateKey { index: 4 });
		assert_eq!(err.to_string(), "imkvdb: entry 4 repeats an earlier key");
	}
}

//! IMKVDB: the key-value archive format Ryujinx uses for its save data index.
//!
//! An archive is a 12-byte [header] followed by a sequence of [entries][entry], each of which is a
//! length-prefixed key and value. The format attaches no meaning to the keys and values; that's up
//! to the consumer.
//!
//! ```
//! use imkvdb::Archive;
//!
//! let mut archive = Archive::new();
//! archive.insert(b"key".to_vec(), b"value".to_vec());
//! let bytes = archive.to_bytes()?;
//! assert_eq!(Archive::from_bytes(&bytes)?, archive);
//! # Ok::<(), imkvdb::Error>(())
//! ```

#![warn(clippy::unwrap_used, missing_docs)]
#![deny(rust_2018_idioms)]

#[doc(inline)]
pub use self::archive::Archive;
#[doc(inline)]
pub use self::error::{Error, ErrorKind, Result};

pub mod archive;
pub mod constants;
pub mod entry;
pub mod error;
pub mod header;

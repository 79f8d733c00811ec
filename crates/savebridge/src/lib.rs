//! Savebridge: move Checkpoint save backups into Ryujinx.
//!
//! Ryujinx keeps each save in a numbered slot folder, identified by a small binary record
//! ([`extra_data`]) and listed in a save data index ([`store`], an [IMKVDB][imkvdb] archive).
//! Copying save files alone isn't enough: the slot must have the right record and the index
//! must know about it. The [`import`] module does all three.
//!
//! ```no_run
//! use std::path::Path;
//! use savebridge::{import::{Importer, ImportOptions}, layout::Layout, storage::LocalStorage};
//!
//! let layout = Layout::ryujinx(Path::new("/home/me/.config/Ryujinx"));
//! let mut importer = Importer::open(LocalStorage, layout, ImportOptions::default())?;
//! for report in importer.run(Path::new("/media/sd/switch/Checkpoint/saves"))? {
//! 	println!("{report:?}");
//! }
//! # Ok::<(), savebridge::error::Error>(())
//! ```

#![warn(clippy::unwrap_used, missing_docs)]
#![deny(rust_2018_idioms)]

pub mod error;
pub mod extra_data;
pub mod ids;
pub mod import;
pub mod inspect;
pub mod layout;
pub mod slots;
pub mod storage;
pub mod store;

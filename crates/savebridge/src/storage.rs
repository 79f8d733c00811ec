//! Filesystem access, as a trait.
//!
//! The importer only ever touches the filesystem through [`Storage`], so it can be wrapped: see
//! [`DryRun`], which lets reads through and only logs writes.
//!
//! This is implemented for the local filesystem in [`LocalStorage`].

use std::{
	ffi::OsString,
	fs::{self, File},
	io::{ErrorKind, Result},
	path::Path,
	time::SystemTime,
};

use tracing::{info, instrument, trace};
use walkdir::WalkDir;

/// A directory entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
	/// File name of the entry.
	pub name: OsString,

	/// Whether this is a directory (following symlinks).
	pub is_dir: bool,
}

impl DirEntry {
	/// The name as a string, if it's valid unicode.
	pub fn name_str(&self) -> Option<&str> {
		self.name.to_str()
	}
}

/// Filesystem operations used for importing.
pub trait Storage {
	/// List a directory, sorted by name.
	fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

	/// Read a whole file. Returns `None` if it doesn't exist.
	fn read(&self, path: &Path) -> Result<Option<Vec<u8>>>;

	/// Write a whole file, replacing it if it exists.
	fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;

	/// Create a directory and its parents. Does nothing if it already exists.
	fn create_dir_all(&self, path: &Path) -> Result<()>;

	/// Copy the contents of a directory into another, recursively.
	///
	/// Files that already exist at the destination are overwritten; directories are merged.
	/// Copied files keep their modification time. Returns the number of files copied.
	fn copy_tree(&self, from: &Path, to: &Path) -> Result<u64>;

	/// Last modification time.
	fn modified(&self, path: &Path) -> Result<SystemTime>;

	/// Whether the path is an existing directory.
	fn is_dir(&self, path: &Path) -> bool;
}

/// The local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorage;

impl Storage for LocalStorage {
	#[instrument(level = "trace")]
	fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
		let mut entries = Vec::new();
		for entry in fs::read_dir(path)? {
			let entry = entry?;
			let file_type = entry.file_type()?;
			let is_dir = if file_type.is_symlink() {
				fs::metadata(entry.path()).map_or(false, |meta| meta.is_dir())
			} else {
				file_type.is_dir()
			};

			trace!(name=?entry.file_name(), %is_dir, "entry");
			entries.push(DirEntry {
				name: entry.file_name(),
				is_dir,
			});
		}

		entries.sort_by(|a, b| a.name.cmp(&b.name));
		Ok(entries)
	}

	#[instrument(level = "trace")]
	fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
		match fs::read(path) {
			Ok(bytes) => Ok(Some(bytes)),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
			Err(err) => Err(err),
		}
	}

	#[instrument(level = "trace", skip(bytes), fields(length = bytes.len()))]
	fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
		fs::write(path, bytes)
	}

	#[instrument(level = "trace")]
	fn create_dir_all(&self, path: &Path) -> Result<()> {
		fs::create_dir_all(path)
	}

	#[instrument(level = "trace")]
	fn copy_tree(&self, from: &Path, to: &Path) -> Result<u64> {
		let mut files = 0;
		for entry in WalkDir::new(from).min_depth(1).follow_links(true) {
			let entry = entry?;
			let relative = entry
				.path()
				.strip_prefix(from)
				.map_err(std::io::Error::other)?;
			let target = to.join(relative);

			if entry.file_type().is_dir() {
				trace!(?target, "create directory");
				fs::create_dir_all(&target)?;
			} else {
				trace!(source=?entry.path(), ?target, "copy file");
				if let Some(parent) = target.parent() {
					fs::create_dir_all(parent)?;
				}
				fs::copy(entry.path(), &target)?;
				let modified = entry.metadata()?.modified()?;
				File::options()
					.write(true)
					.open(&target)?
					.set_modified(modified)?;
				files += 1;
			}
		}

		Ok(files)
	}

	fn modified(&self, path: &Path) -> Result<SystemTime> {
		fs::metadata(path)?.modified()
	}

	fn is_dir(&self, path: &Path) -> bool {
		path.is_dir()
	}
}

/// Storage wrapper that performs reads but only logs writes.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRun<S>(pub S);

impl<S: Storage> Storage for DryRun<S> {
	fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
		self.0.list_dir(path)
	}

	fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
		self.0.read(path)
	}

	fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
		info!(?path, length=%bytes.len(), "dry run: would write file");
		Ok(())
	}

	fn create_dir_all(&self, path: &Path) -> Result<()> {
		if !self.0.is_dir(path) {
			info!(?path, "dry run: would create directory");
		}
		Ok(())
	}

	fn copy_tree(&self, from: &Path, to: &Path) -> Result<u64> {
		info!(?from, ?to, "dry run: would copy directory contents");
		Ok(0)
	}

	fn modified(&self, path: &Path) -> Result<SystemTime> {
		self.0.modified(path)
	}

	fn is_dir(&self, path: &Path) -> bool {
		self.0.is_dir(path)
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn list_is_sorted_and_typed() {
		let tmp = TempDir::new().unwrap();
		fs::create_dir(tmp.path().join("b")).unwrap();
		fs::write(tmp.path().join("a"), b"file").unwrap();
		fs::create_dir(tmp.path().join("c")).unwrap();

		let entries = LocalStorage.list_dir(tmp.path()).unwrap();
		let summary: Vec<_> = entries
			.iter()
			.map(|entry| (entry.name_str().unwrap(), entry.is_dir))
			.collect();
		assert_eq!(summary, [("a", false), ("b", true), ("c", true)]);
	}

	#[test]
	fn read_missing_is_none() {
		let tmp = TempDir::new().unwrap();
		assert_eq!(LocalStorage.read(&tmp.path().join("nope")).unwrap(), None);
	}

	#[test]
	fn copy_merges_and_overwrites() {
		let tmp = TempDir::new().unwrap();
		let from = tmp.path().join("from");
		let to = tmp.path().join("to");
		fs::create_dir_all(from.join("sub")).unwrap();
		fs::write(from.join("save.dat"), b"new").unwrap();
		fs::write(from.join("sub/slot1.bin"), b"one").unwrap();

		fs::create_dir_all(to.join("sub")).unwrap();
		fs::write(to.join("save.dat"), b"old").unwrap();
		fs::write(to.join("sub/keep.bin"), b"keep").unwrap();

		assert_eq!(LocalStorage.copy_tree(&from, &to).unwrap(), 2);
		assert_eq!(fs::read(to.join("save.dat")).unwrap(), b"new");
		assert_eq!(fs::read(to.join("sub/slot1.bin")).unwrap(), b"one");
		assert_eq!(fs::read(to.join("sub/keep.bin")).unwrap(), b"keep");
	}

	#[test]
	fn copy_keeps_modification_time() {
		let tmp = TempDir::new().unwrap();
		let from = tmp.path().join("from");
		let to = tmp.path().join("to");
		fs::create_dir_all(&from).unwrap();
		fs::write(from.join("save.dat"), b"data").unwrap();

		let then = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_600_000_000);
		File::options()
			.write(true)
			.open(from.join("save.dat"))
			.unwrap()
			.set_modified(then)
			.unwrap();

		LocalStorage.copy_tree(&from, &to).unwrap();
		assert_eq!(LocalStorage.modified(&to.join("save.dat")).unwrap(), then);
	}

	#[test]
	fn dry_run_writes_nothing() {
		let tmp = TempDir::new().unwrap();
		let storage = DryRun(LocalStorage);
		let dir = tmp.path().join("new");
		storage.create_dir_all(&dir).unwrap();
		storage.write(&dir.join("file"), b"data").unwrap();
		assert!(!dir.exists());

		fs::write(tmp.path().join("real"), b"data").unwrap();
		assert_eq!(
			storage.read(&tmp.path().join("real")).unwrap(),
			Some(b"data".to_vec())
		);
	}
}

//! File-backed [`TokenStore`] writing the token file atomically.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{StoreError, StoreFuture, TokenFile, TokenStore},
};

/// Persists the token file at a fixed path, replacing it through a temporary sibling.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	write_lock: Arc<Mutex<()>>,
}
impl FileStore {
	/// Creates a store for `path`, creating the parent directory when needed.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		Ok(Self { path, write_lock: Arc::new(Mutex::new(())) })
	}

	/// Location of the token file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn read_now(&self) -> Result<Option<TokenFile>, StoreError> {
		if !self.path.exists() {
			return Ok(None);
		}

		let text = fs::read_to_string(&self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", self.path.display()),
		})?;

		if text.trim().is_empty() {
			return Ok(None);
		}

		TokenFile::from_json(&text).map(Some)
	}

	fn write_now(&self, file: &TokenFile) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock();
		let serialized = file.to_json()?;
		let mut tmp_path = self.path.clone();

		Self::ensure_parent_exists(&self.path)?;
		tmp_path.set_extension("tmp");

		{
			let mut tmp = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			tmp.write_all(serialized.as_bytes()).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			tmp.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn save<'a>(&'a self, file: &'a TokenFile) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.write_now(file) })
	}

	fn load(&self) -> StoreFuture<'_, Option<TokenFile>> {
		Box::pin(async move { self.read_now() })
	}
}

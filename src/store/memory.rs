//! Thread-safe in-memory [`TokenStore`] for tests and demos.

// self
use crate::{
	_prelude::*,
	store::{StoreFuture, TokenFile, TokenStore},
};

/// Keeps the most recently saved token file in process memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Option<TokenFile>>>);
impl MemoryStore {
	/// Creates a store pre-seeded with `file`.
	pub fn with_file(file: TokenFile) -> Self {
		Self(Arc::new(RwLock::new(Some(file))))
	}

	/// Copy of the stored file.
	pub fn snapshot(&self) -> Option<TokenFile> {
		self.0.read().clone()
	}
}
impl TokenStore for MemoryStore {
	fn save<'a>(&'a self, file: &'a TokenFile) -> StoreFuture<'a, ()> {
		let slot = self.0.clone();
		let file = file.clone();

		Box::pin(async move {
			*slot.write() = Some(file);

			Ok(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<TokenFile>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}
}

use std::cell::RefCell;
use std::future::Future;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::assets::catalog::AssetRef;
use crate::assets::prefab::Prefab;
use crate::errors::AssetError;

/// The one capability the engine consumes from its host: turn a reference
/// into a freshly parsed fragment, asynchronously.
///
/// Every call is independent. Implementations need not cache or dedupe.
pub trait AssetLoader {
    fn load(&self, reference: &AssetRef) -> impl Future<Output = Result<Prefab, AssetError>>;
}

/// Reads fragments from the local file system.
///
/// References are resolved against `root_path`; a leading `/` is treated as
/// relative to that root.
#[cfg(not(target_arch = "wasm32"))]
pub struct FileAssetLoader {
    root_path: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileAssetLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root_path: root.as_ref().to_path_buf(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    #[must_use]
    pub fn resolve(&self, reference: &AssetRef) -> PathBuf {
        self.root_path
            .join(reference.as_str().trim_start_matches('/'))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetLoader for FileAssetLoader {
    async fn load(&self, reference: &AssetRef) -> Result<Prefab, AssetError> {
        let path = self.resolve(reference);
        let bytes = tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound(path.clone())
            } else {
                AssetError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        #[cfg(feature = "gltf")]
        {
            crate::assets::loaders::gltf::parse_prefab(&bytes, reference.as_str())
        }
        #[cfg(not(feature = "gltf"))]
        {
            let _ = bytes;
            Err(AssetError::FeatureNotEnabled("gltf"))
        }
    }
}

#[derive(Debug, Clone)]
enum MemoryEntry {
    Prefab(Arc<Prefab>),
    Failure(String),
}

/// Serves fragments registered in memory. Unknown references fail with
/// [`AssetError::NotFound`].
///
/// Every request is recorded, which lets callers observe which fetches were
/// actually issued.
#[derive(Debug, Default)]
pub struct MemoryAssetLoader {
    entries: FxHashMap<AssetRef, MemoryEntry>,
    requests: RefCell<Vec<AssetRef>>,
}

impl MemoryAssetLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<AssetRef>, prefab: Prefab) {
        self.entries
            .insert(reference.into(), MemoryEntry::Prefab(Arc::new(prefab)));
    }

    /// Registers a reference whose every load fails with `reason`.
    pub fn insert_failure(&mut self, reference: impl Into<AssetRef>, reason: impl Into<String>) {
        self.entries
            .insert(reference.into(), MemoryEntry::Failure(reason.into()));
    }

    #[must_use]
    pub fn with(mut self, reference: impl Into<AssetRef>, prefab: Prefab) -> Self {
        self.insert(reference, prefab);
        self
    }

    #[must_use]
    pub fn with_failure(
        mut self,
        reference: impl Into<AssetRef>,
        reason: impl Into<String>,
    ) -> Self {
        self.insert_failure(reference, reason);
        self
    }

    /// References requested so far, in request order.
    #[must_use]
    pub fn requests(&self) -> Vec<AssetRef> {
        self.requests.borrow().clone()
    }
}

impl AssetLoader for MemoryAssetLoader {
    async fn load(&self, reference: &AssetRef) -> Result<Prefab, AssetError> {
        self.requests.borrow_mut().push(reference.clone());
        match self.entries.get(reference) {
            Some(MemoryEntry::Prefab(prefab)) => Ok(Prefab::clone(prefab)),
            Some(MemoryEntry::Failure(reason)) => Err(AssetError::Rejected(reason.clone())),
            None => Err(AssetError::NotFound(reference.as_str().into())),
        }
    }
}

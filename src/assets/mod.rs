pub mod catalog;
pub mod fetcher;
pub mod io;
pub mod loaders;
pub mod prefab;

pub use catalog::{AssetCatalog, AssetRef};
pub use fetcher::{AssetFetcher, FetchFuture};
#[cfg(not(target_arch = "wasm32"))]
pub use io::FileAssetLoader;
pub use io::{AssetLoader, MemoryAssetLoader};
pub use prefab::{Prefab, PrefabNode, SharedPrefab};

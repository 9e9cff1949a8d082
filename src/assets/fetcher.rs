use std::rc::Rc;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::assets::catalog::{AssetCatalog, AssetRef};
use crate::assets::io::AssetLoader;
use crate::assets::prefab::SharedPrefab;
use crate::errors::AssetError;

/// Future returned by [`AssetFetcher::fetch`]. It owns everything it needs,
/// so the caller may keep it alive across configuration changes.
pub type FetchFuture = LocalBoxFuture<'static, Result<SharedPrefab, AssetError>>;

/// Wraps the host's [`AssetLoader`] and the catalog it resolves indices
/// against.
pub struct AssetFetcher<L> {
    loader: Rc<L>,
    catalog: AssetCatalog,
}

impl<L: AssetLoader + 'static> AssetFetcher<L> {
    pub fn new(loader: L, catalog: AssetCatalog) -> Self {
        Self {
            loader: Rc::new(loader),
            catalog,
        }
    }

    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    #[inline]
    #[must_use]
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Starts loading `reference`. Nothing happens until the future is polled.
    pub fn fetch(&self, reference: AssetRef) -> FetchFuture {
        let loader = Rc::clone(&self.loader);
        async move {
            log::debug!("Fetching {reference}");
            match loader.load(&reference).await {
                Ok(prefab) => Ok(Arc::new(prefab)),
                Err(err) => {
                    log::debug!("Fetch of {reference} failed: {err}");
                    Err(err)
                }
            }
        }
        .boxed_local()
    }
}

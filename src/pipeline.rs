//! Reactive Update Pipeline
//!
//! [`DeskConfigurator`] is the entry point of the crate. It owns the
//! configuration store, the asset fetcher and the scene composer, and turns
//! every accepted parameter change into the right mix of actions:
//!
//! - **Transform-only**: instances already in the scene are re-placed
//!   synchronously, before the setter returns.
//! - **Reload**: a new fetch is issued with a fresh load token; the result is
//!   assembled and swapped in when it completes, unless a newer fetch for the
//!   same slot was issued in the meantime.
//!
//! # Driving the loop
//!
//! Everything runs on one thread. Fetches are kept in a
//! [`FuturesUnordered`]; the host drives them either with [`pump`], which
//! applies whatever has completed without blocking, or by awaiting
//! [`run_until_idle`]. Each completion is applied inside one synchronous
//! step, so the token check and the scene swap cannot be interleaved.
//!
//! ```rust,ignore
//! let mut desk = DeskConfigurator::new(&settings, FileAssetLoader::new(&settings.asset_root))?;
//! desk.begin_initial_load();
//! desk.run_until_idle().await;
//!
//! desk.set_desk_width(2400)?; // legs and supports follow immediately
//! desk.set_material(4)?;      // top reloads in the background
//! desk.run_until_idle().await;
//! ```
//!
//! [`pump`]: DeskConfigurator::pump
//! [`run_until_idle`]: DeskConfigurator::run_until_idle

use std::sync::Arc;

use bitflags::bitflags;
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};

use crate::assets::{AssetFetcher, AssetLoader, AssetRef, SharedPrefab};
use crate::composer::{Commit, FailureOutcome, LoadToken, SceneComposer, SlotState};
use crate::config::{ConfigChange, ConfigStore, DeskConfig, Parameter};
use crate::errors::{AssetError, Result};
use crate::parts::{self, Slot};
use crate::scene::{NodeHandle, Scene};
use crate::settings::ConfiguratorSettings;

bitflags! {
    /// Work triggered by a parameter change.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Effects: u8 {
        const RETRANSFORM_TOP      = 1 << 0;
        const RETRANSFORM_LEGS     = 1 << 1;
        const RETRANSFORM_SUPPORTS = 1 << 2;
        const RELOAD_TOP           = 1 << 3;
        const RELOAD_SUPPORTS      = 1 << 4;
    }
}

impl Effects {
    /// Dispatch table. Depth only ever affects the top.
    #[must_use]
    pub fn of(parameter: Parameter) -> Self {
        match parameter {
            Parameter::LegHeight => Self::RETRANSFORM_LEGS | Self::RETRANSFORM_SUPPORTS,
            Parameter::DeskWidth => {
                Self::RETRANSFORM_TOP
                    | Self::RETRANSFORM_LEGS
                    | Self::RETRANSFORM_SUPPORTS
                    | Self::RELOAD_TOP
            }
            Parameter::DeskDepth => Self::RETRANSFORM_TOP | Self::RELOAD_TOP,
            Parameter::Material => Self::RELOAD_TOP,
            Parameter::SupportVariant => Self::RELOAD_SUPPORTS,
        }
    }

    pub fn retransformed_slots(self) -> impl Iterator<Item = Slot> {
        [
            (Self::RETRANSFORM_TOP, Slot::Top),
            (Self::RETRANSFORM_LEGS, Slot::Legs),
            (Self::RETRANSFORM_SUPPORTS, Slot::Supports),
        ]
        .into_iter()
        .filter_map(move |(flag, slot)| self.contains(flag).then_some(slot))
    }

    pub fn reloaded_slots(self) -> impl Iterator<Item = Slot> {
        [
            (Self::RELOAD_TOP, Slot::Top),
            (Self::RELOAD_SUPPORTS, Slot::Supports),
        ]
        .into_iter()
        .filter_map(move |(flag, slot)| self.contains(flag).then_some(slot))
    }
}

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    NotLoaded,
    /// Initial fetches issued, not every slot attached yet.
    Loading,
    /// Every slot has been attached at least once.
    Ready,
}

/// Something the host may want to surface.
#[derive(Debug, Clone)]
pub enum ConfiguratorEvent {
    Attached {
        slot: Slot,
        token: LoadToken,
        node: NodeHandle,
    },
    Replaced {
        slot: Slot,
        token: LoadToken,
        old: NodeHandle,
        new: NodeHandle,
    },
    /// A superseded fetch completed and was ignored.
    StaleDiscarded { slot: Slot, token: LoadToken },
    LoadFailed {
        slot: Slot,
        reference: Option<AssetRef>,
        error: Arc<AssetError>,
        /// Node that stays on display, `None` when the slot is unavailable
        fallback: Option<NodeHandle>,
    },
    Ready,
}

struct Completion {
    token: LoadToken,
    reference: AssetRef,
    result: std::result::Result<SharedPrefab, AssetError>,
}

pub struct DeskConfigurator<L> {
    store: ConfigStore,
    fetcher: AssetFetcher<L>,
    composer: SceneComposer,
    in_flight: FuturesUnordered<LocalBoxFuture<'static, Completion>>,
    lifecycle: Lifecycle,
    events: Vec<ConfiguratorEvent>,
}

/// Saturates at `i64::MAX`, which no catalog can reach, so oversized indices
/// fall through to the range check.
fn catalog_index(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

impl<L: AssetLoader + 'static> DeskConfigurator<L> {
    /// Validates `settings` and builds the scene with its static environment.
    /// No fetch is issued until [`begin_initial_load`](Self::begin_initial_load).
    pub fn new(settings: &ConfiguratorSettings, loader: L) -> Result<Self> {
        settings.validate()?;
        let store = ConfigStore::new(settings.defaults, settings.limits())?;
        let composer = SceneComposer::new(&store.current());
        let fetcher = AssetFetcher::new(loader, settings.catalog.clone());

        Ok(Self {
            store,
            fetcher,
            composer,
            in_flight: FuturesUnordered::new(),
            lifecycle: Lifecycle::NotLoaded,
            events: Vec::new(),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn config(&self) -> DeskConfig {
        self.store.current()
    }

    #[inline]
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    /// The root scene graph, for the external renderer.
    #[inline]
    #[must_use]
    pub fn scene(&self) -> &Scene {
        self.composer.scene()
    }

    #[inline]
    #[must_use]
    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }

    #[inline]
    #[must_use]
    pub fn loader(&self) -> &L {
        self.fetcher.loader()
    }

    #[inline]
    #[must_use]
    pub fn slot_state(&self, slot: Slot) -> &SlotState {
        self.composer.state(slot)
    }

    /// Number of fetches not yet applied, stale ones included.
    #[inline]
    #[must_use]
    pub fn pending_loads(&self) -> usize {
        self.in_flight.len()
    }

    /// Takes every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<ConfiguratorEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn update_matrix_world(&mut self) {
        self.composer.update_matrix_world();
    }

    // ========================================================================
    // Mutation surface
    // ========================================================================

    pub fn set_leg_height(&mut self, mm: i32) -> Result<Option<ConfigChange>> {
        self.set(Parameter::LegHeight, i64::from(mm))
    }

    pub fn set_desk_width(&mut self, mm: i32) -> Result<Option<ConfigChange>> {
        self.set(Parameter::DeskWidth, i64::from(mm))
    }

    pub fn set_desk_depth(&mut self, mm: i32) -> Result<Option<ConfigChange>> {
        self.set(Parameter::DeskDepth, i64::from(mm))
    }

    /// Selects a desk-top material by catalog index.
    ///
    /// Indices past the catalog end, including ones beyond `i64::MAX`, are
    /// rejected with [`ConfigError::OutOfRange`](crate::errors::ConfigError::OutOfRange).
    pub fn set_material(&mut self, index: usize) -> Result<Option<ConfigChange>> {
        self.set(Parameter::Material, catalog_index(index))
    }

    /// Selects a support variant by catalog index. Out-of-range indices are
    /// rejected like in [`Self::set_material`].
    pub fn set_support_variant(&mut self, index: usize) -> Result<Option<ConfigChange>> {
        self.set(Parameter::SupportVariant, catalog_index(index))
    }

    /// Applies one mutation and dispatches its effects.
    ///
    /// Rejected values leave the configuration and the scene untouched.
    /// Setting the current value is a no-op and returns `Ok(None)`.
    pub fn set(&mut self, parameter: Parameter, value: i64) -> Result<Option<ConfigChange>> {
        let change = match self.store.set(parameter, value) {
            Ok(Some(change)) => change,
            Ok(None) => return Ok(None),
            Err(err) => {
                log::warn!("Rejected configuration change: {err}");
                return Err(err.into());
            }
        };

        log::debug!(
            "{parameter}: {} -> {} (revision {})",
            change.previous,
            change.current,
            change.revision
        );
        self.dispatch(Effects::of(parameter));
        Ok(Some(change))
    }

    fn dispatch(&mut self, effects: Effects) {
        let config = self.store.current();
        for slot in effects.retransformed_slots() {
            self.composer.retransform_in_place(slot, |anchor, transform| {
                parts::retransform(anchor, &config, transform);
            });
        }

        // Before the initial load, nothing is fetched: the initial fetches
        // will read the configuration when they are issued.
        if self.lifecycle == Lifecycle::NotLoaded {
            return;
        }
        for slot in effects.reloaded_slots() {
            self.request(slot);
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Issues the fetches for all three slots at once. Calling it again is a
    /// no-op.
    pub fn begin_initial_load(&mut self) {
        if self.lifecycle != Lifecycle::NotLoaded {
            return;
        }
        self.lifecycle = Lifecycle::Loading;
        log::info!("Starting initial load");
        for slot in Slot::ALL {
            self.request(slot);
        }
    }

    /// Re-issues fetches for slots whose last fetch failed with nothing to
    /// fall back to. Returns the number of fetches issued.
    pub fn retry_unavailable(&mut self) -> usize {
        let failed: Vec<Slot> = Slot::ALL
            .into_iter()
            .filter(|&slot| matches!(self.composer.state(slot), SlotState::Unavailable(_)))
            .collect();
        for &slot in &failed {
            log::info!("Retrying {slot}");
            self.request(slot);
        }
        failed.len()
    }

    fn reference_for(&self, slot: Slot) -> std::result::Result<AssetRef, AssetError> {
        let config = self.store.current();
        let catalog = self.fetcher.catalog();
        match slot {
            Slot::Top => catalog.material(config.material_index()).cloned(),
            Slot::Legs => Ok(catalog.leg().clone()),
            Slot::Supports => catalog.support(config.support_variant_index()).cloned(),
        }
    }

    fn request(&mut self, slot: Slot) {
        let reference = match self.reference_for(slot) {
            Ok(reference) => reference,
            Err(err) => {
                log::error!("Cannot resolve asset for {slot}: {err}");
                self.events.push(ConfiguratorEvent::LoadFailed {
                    slot,
                    reference: None,
                    error: Arc::new(err),
                    fallback: self.composer.current(slot),
                });
                return;
            }
        };

        let token = self.composer.issue_token(slot);
        log::debug!("Issued {token} for {reference}");

        let fetch = self.fetcher.fetch(reference.clone());
        self.in_flight.push(
            async move {
                Completion {
                    token,
                    reference,
                    result: fetch.await,
                }
            }
            .boxed_local(),
        );
    }

    /// Applies every completion that is already available, without waiting.
    /// Returns the number of completions applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let next = self.in_flight.next().now_or_never();
            let Some(Some(completion)) = next else {
                break;
            };
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Waits for every outstanding fetch, applying each as it completes.
    pub async fn run_until_idle(&mut self) {
        loop {
            let Some(completion) = self.in_flight.next().await else {
                break;
            };
            self.apply(completion);
        }
    }

    fn apply(&mut self, completion: Completion) {
        let Completion {
            token,
            reference,
            result,
        } = completion;
        let slot = token.slot();

        match result {
            Ok(template) => {
                if !self.composer.is_current(token) {
                    log::debug!("Discarding stale {token} ({reference})");
                    self.events
                        .push(ConfiguratorEvent::StaleDiscarded { slot, token });
                    return;
                }

                // Assemble with the configuration as it is now, not as it was
                // when the fetch was issued.
                let part = parts::assemble(slot, template, &self.store.current());
                let commit = if self.composer.current(slot).is_some() {
                    self.composer.replace(token, part)
                } else {
                    self.composer.attach_initial(token, part)
                };

                match commit {
                    Commit::Attached(node) => {
                        self.events
                            .push(ConfiguratorEvent::Attached { slot, token, node });
                    }
                    Commit::Replaced { old, new } => {
                        self.events.push(ConfiguratorEvent::Replaced {
                            slot,
                            token,
                            old,
                            new,
                        });
                    }
                    Commit::Stale => {
                        self.events
                            .push(ConfiguratorEvent::StaleDiscarded { slot, token });
                    }
                }
            }
            Err(err) => {
                let error = Arc::new(err);
                let fallback = match self.composer.fail(token, Arc::clone(&error)) {
                    FailureOutcome::Stale => {
                        log::debug!("Ignoring failure of stale {token} ({reference}): {error}");
                        self.events
                            .push(ConfiguratorEvent::StaleDiscarded { slot, token });
                        return;
                    }
                    FailureOutcome::KeptPrevious(node) => {
                        log::warn!("Loading {reference} for {slot} failed, keeping previous: {error}");
                        Some(node)
                    }
                    FailureOutcome::Unavailable => {
                        log::error!("Loading {reference} for {slot} failed, slot unavailable: {error}");
                        None
                    }
                };
                self.events.push(ConfiguratorEvent::LoadFailed {
                    slot,
                    reference: Some(reference),
                    error,
                    fallback,
                });
            }
        }

        self.update_lifecycle();
    }

    fn update_lifecycle(&mut self) {
        if self.lifecycle == Lifecycle::Loading
            && Slot::ALL
                .into_iter()
                .all(|slot| self.composer.current(slot).is_some())
        {
            self.lifecycle = Lifecycle::Ready;
            log::info!("All parts attached, scene ready");
            self.events.push(ConfiguratorEvent::Ready);
        }
    }
}

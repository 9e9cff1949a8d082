#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod assets;
pub mod composer;
pub mod config;
pub mod errors;
pub mod layout;
pub mod parts;
pub mod pipeline;
pub mod scene;
pub mod settings;

#[cfg(not(target_arch = "wasm32"))]
pub use assets::FileAssetLoader;
pub use assets::{AssetCatalog, AssetLoader, AssetRef, MemoryAssetLoader, Prefab, SharedPrefab};
pub use composer::{LoadToken, SceneComposer, SlotState};
pub use config::{ConfigChange, ConfigStore, DeskConfig, Parameter};
pub use errors::{AssetError, ConfigError, Error, Result};
pub use layout::Anchor;
pub use parts::Slot;
pub use pipeline::{ConfiguratorEvent, DeskConfigurator, Effects, Lifecycle};
pub use scene::{Node, NodeHandle, NodeKind, Scene, Transform};
pub use settings::ConfiguratorSettings;

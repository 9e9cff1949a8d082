//! Headless desk configurator.
//!
//! ```text
//! desk_cli [--placeholder] [settings.json] [parameter=value ...]
//! ```
//!
//! Loads the initial desk, applies each `parameter=value` mutation in order
//! and prints the resulting part transforms. With `--placeholder`, every
//! catalog entry is served from memory as a single-mesh fragment, so no
//! asset files are needed.
//!
//! Run with `RUST_LOG=deskcraft=debug` to follow load tokens.

use anyhow::{Context, bail};
use deskcraft::{
    AssetLoader, ConfiguratorEvent, ConfiguratorSettings, DeskConfigurator, FileAssetLoader,
    MemoryAssetLoader, Parameter, Prefab, Slot, SlotState,
};

struct Options {
    placeholder: bool,
    settings: ConfiguratorSettings,
    mutations: Vec<(Parameter, i64)>,
}

fn parse_args() -> anyhow::Result<Options> {
    let mut placeholder = false;
    let mut settings = None;
    let mut mutations = Vec::new();

    for arg in std::env::args().skip(1) {
        if arg == "--placeholder" {
            placeholder = true;
        } else if let Some((name, value)) = arg.split_once('=') {
            let parameter = Parameter::from_name(name)
                .with_context(|| format!("unknown parameter `{name}`"))?;
            let value: i64 = value
                .parse()
                .with_context(|| format!("`{value}` is not an integer"))?;
            mutations.push((parameter, value));
        } else if settings.is_none() {
            settings = Some(
                ConfiguratorSettings::from_file(&arg)
                    .with_context(|| format!("failed to load settings from {arg}"))?,
            );
        } else {
            bail!("unexpected argument `{arg}`");
        }
    }

    Ok(Options {
        placeholder,
        settings: settings.unwrap_or_default(),
        mutations,
    })
}

fn placeholder_loader(settings: &ConfiguratorSettings) -> MemoryAssetLoader {
    let catalog = &settings.catalog;
    let mut loader = MemoryAssetLoader::new();
    for reference in catalog
        .materials
        .iter()
        .chain(&catalog.supports)
        .chain(std::iter::once(&catalog.leg))
    {
        loader.insert(
            reference.clone(),
            Prefab::single(reference.as_str(), reference.file_name()),
        );
    }
    loader
}

fn report_events(events: Vec<ConfiguratorEvent>) {
    for event in events {
        match event {
            ConfiguratorEvent::LoadFailed {
                slot,
                reference,
                error,
                ..
            } => {
                let what = reference.map_or_else(|| "?".to_string(), |r| r.to_string());
                println!("  ! {slot}: {what}: {error}");
            }
            ConfiguratorEvent::StaleDiscarded { token, .. } => {
                println!("  - discarded {token}");
            }
            ConfiguratorEvent::Ready => println!("  * ready"),
            ConfiguratorEvent::Attached { .. } | ConfiguratorEvent::Replaced { .. } => {}
        }
    }
}

fn print_parts<L: AssetLoader + 'static>(desk: &DeskConfigurator<L>) {
    let scene = desk.scene();
    for slot in Slot::ALL {
        let root = match desk.slot_state(slot) {
            SlotState::Attached(root) => *root,
            SlotState::Unavailable(err) => {
                println!("{slot:>10}: unavailable ({err})");
                continue;
            }
            other => {
                println!("{slot:>10}: {other:?}");
                continue;
            }
        };

        let instances = match scene.children(root) {
            [] => vec![root],
            children => children.to_vec(),
        };
        for handle in instances {
            let Some(node) = scene.get_node(handle) else {
                continue;
            };
            let t = &node.transform;
            let source = node.template().map_or("-", |prefab| prefab.source.as_str());
            println!(
                "{slot:>10}: {:<12} pos {:>6.3} {:>6.3} {:>6.3}  scale {:>6.3} {:>6.3} {:>6.3}  [{source}]",
                node.name,
                t.position.x,
                t.position.y,
                t.position.z,
                t.scale.x,
                t.scale.y,
                t.scale.z,
            );
        }
    }
}

async fn drive<L: AssetLoader + 'static>(
    mut desk: DeskConfigurator<L>,
    mutations: &[(Parameter, i64)],
) -> anyhow::Result<()> {
    desk.begin_initial_load();
    desk.run_until_idle().await;
    report_events(desk.drain_events());
    println!("initial {:?}", desk.config());
    print_parts(&desk);

    for &(parameter, value) in mutations {
        println!("\n{parameter} = {value}");
        match desk.set(parameter, value) {
            Ok(Some(_)) => {}
            Ok(None) => println!("  (unchanged)"),
            Err(err) => {
                println!("  rejected: {err}");
                continue;
            }
        }
        desk.run_until_idle().await;
        report_events(desk.drain_events());
        print_parts(&desk);
    }

    desk.update_matrix_world();
    log::info!("Final scene holds {} nodes", desk.scene().node_count());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = parse_args()?;
    if options.placeholder {
        let loader = placeholder_loader(&options.settings);
        let desk = DeskConfigurator::new(&options.settings, loader)?;
        drive(desk, &options.mutations).await
    } else {
        let loader = FileAssetLoader::new(&options.settings.asset_root);
        let desk = DeskConfigurator::new(&options.settings, loader)?;
        drive(desk, &options.mutations).await
    }
}

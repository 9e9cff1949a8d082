//! Reactive Update Pipeline Tests
//!
//! Tests for:
//! - Initial load lifecycle and the Ready event
//! - Transform-only changes applied without any fetch
//! - Reload races: only the latest request attaches, in either completion order
//! - Failed reloads keep the previous part; failed initial loads can be retried
//! - Rejected and no-op mutations
//!
//! Fetch completion order is controlled by `GatedLoader`, which parks every
//! request on a oneshot channel until the test resolves it.

use std::cell::RefCell;

use deskcraft::assets::{AssetCatalog, AssetLoader, AssetRef, MemoryAssetLoader, Prefab};
use deskcraft::composer::SlotState;
use deskcraft::config::Parameter;
use deskcraft::errors::{AssetError, ConfigError, Error};
use deskcraft::layout::SUPPORT_OFFSETS;
use deskcraft::parts::Slot;
use deskcraft::pipeline::{ConfiguratorEvent, DeskConfigurator, Effects, Lifecycle};
use deskcraft::scene::node::Node;
use deskcraft::settings::ConfiguratorSettings;
use futures::channel::oneshot;
use glam::Vec3;

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

type Reply = Result<Prefab, AssetError>;

#[derive(Default)]
struct GatedLoader {
    pending: RefCell<Vec<(AssetRef, oneshot::Sender<Reply>)>>,
    history: RefCell<Vec<AssetRef>>,
}

impl GatedLoader {
    fn requested(&self) -> Vec<AssetRef> {
        self.history.borrow().clone()
    }

    fn pending(&self) -> Vec<AssetRef> {
        self.pending.borrow().iter().map(|(r, _)| r.clone()).collect()
    }

    fn settle(&self, reference: &AssetRef, reply: Reply) {
        let sender = {
            let mut pending = self.pending.borrow_mut();
            let index = pending
                .iter()
                .position(|(r, _)| r == reference)
                .unwrap_or_else(|| panic!("no pending request for {reference}"));
            pending.remove(index).1
        };
        let _ = sender.send(reply);
    }

    fn resolve(&self, reference: &AssetRef) {
        self.settle(
            reference,
            Ok(Prefab::single(reference.as_str(), reference.file_name())),
        );
    }

    fn reject(&self, reference: &AssetRef) {
        self.settle(reference, Err(AssetError::Rejected("network down".into())));
    }

    fn resolve_all(&self) {
        for reference in self.pending() {
            self.resolve(&reference);
        }
    }
}

impl AssetLoader for GatedLoader {
    async fn load(&self, reference: &AssetRef) -> Result<Prefab, AssetError> {
        let (tx, rx) = oneshot::channel();
        self.history.borrow_mut().push(reference.clone());
        self.pending.borrow_mut().push((reference.clone(), tx));
        rx.await
            .unwrap_or_else(|_| Err(AssetError::Rejected("request dropped".into())))
    }
}

fn catalog() -> AssetCatalog {
    AssetCatalog::default()
}

fn material(index: usize) -> AssetRef {
    catalog().materials[index].clone()
}

fn support(index: usize) -> AssetRef {
    catalog().supports[index].clone()
}

fn memory_loader() -> MemoryAssetLoader {
    let catalog = catalog();
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

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn configurator<L: AssetLoader + 'static>(loader: L) -> DeskConfigurator<L> {
    init_logging();
    DeskConfigurator::new(&ConfiguratorSettings::default(), loader).unwrap()
}

/// A configurator whose initial load has completed.
fn ready_gated() -> DeskConfigurator<GatedLoader> {
    let mut desk = configurator(GatedLoader::default());
    desk.begin_initial_load();
    desk.pump();
    desk.loader().resolve_all();
    desk.pump();
    assert!(desk.is_ready());
    desk.drain_events();
    desk
}

fn instances<'a, L: AssetLoader + 'static>(
    desk: &'a DeskConfigurator<L>,
    slot: Slot,
) -> Vec<&'a Node> {
    let scene = desk.scene();
    let root = desk.composer().current(slot).expect("slot is attached");
    match scene.children(root) {
        [] => vec![scene.get_node(root).unwrap()],
        children => children
            .iter()
            .map(|&h| scene.get_node(h).unwrap())
            .collect(),
    }
}

fn template_source<L: AssetLoader + 'static>(desk: &DeskConfigurator<L>, slot: Slot) -> String {
    instances(desk, slot)[0]
        .template()
        .unwrap()
        .source
        .clone()
}

// ============================================================================
// Dispatch Table
// ============================================================================

#[test]
fn effects_per_parameter() {
    assert_eq!(
        Effects::of(Parameter::LegHeight),
        Effects::RETRANSFORM_LEGS | Effects::RETRANSFORM_SUPPORTS
    );
    assert!(Effects::of(Parameter::DeskWidth).contains(Effects::RELOAD_TOP));
    assert!(!Effects::of(Parameter::DeskWidth).contains(Effects::RELOAD_SUPPORTS));
    assert_eq!(
        Effects::of(Parameter::DeskDepth),
        Effects::RETRANSFORM_TOP | Effects::RELOAD_TOP
    );
    assert_eq!(Effects::of(Parameter::Material), Effects::RELOAD_TOP);
    assert_eq!(
        Effects::of(Parameter::SupportVariant),
        Effects::RELOAD_SUPPORTS
    );

    let reloaded: Vec<Slot> = Effects::of(Parameter::DeskWidth).reloaded_slots().collect();
    assert_eq!(reloaded, vec![Slot::Top]);
}

// ============================================================================
// Initial Load
// ============================================================================

#[test]
fn initial_load_attaches_all_parts() {
    let mut desk = configurator(memory_loader());
    assert_eq!(desk.lifecycle(), Lifecycle::NotLoaded);

    desk.begin_initial_load();
    assert_eq!(desk.lifecycle(), Lifecycle::Loading);
    assert_eq!(desk.pending_loads(), 3);

    pollster::block_on(desk.run_until_idle());

    assert!(desk.is_ready());
    assert_eq!(desk.pending_loads(), 0);
    for slot in Slot::ALL {
        assert!(matches!(desk.slot_state(slot), SlotState::Attached(_)));
    }

    let top = instances(&desk, Slot::Top);
    assert_eq!(top.len(), 1);
    assert!((top[0].transform.scale - Vec3::new(10.0, 0.3, 6.0)).abs().max_element() < EPSILON);

    let legs = instances(&desk, Slot::Legs);
    assert_eq!(legs.len(), 2);
    for leg in legs {
        assert!((leg.transform.scale - Vec3::new(1.56, 0.8, 1.0)).abs().max_element() < EPSILON);
    }
    assert_eq!(instances(&desk, Slot::Supports).len(), 4);

    let events = desk.drain_events();
    let attached = events
        .iter()
        .filter(|e| matches!(e, ConfiguratorEvent::Attached { .. }))
        .count();
    assert_eq!(attached, 3);
    assert!(matches!(events.last(), Some(ConfiguratorEvent::Ready)));
}

#[test]
fn initial_load_fetches_default_catalog_entries() {
    let mut desk = configurator(memory_loader());
    desk.begin_initial_load();
    pollster::block_on(desk.run_until_idle());

    let mut requested = desk.loader().requests();
    requested.sort();
    let mut expected = vec![material(0), support(0), catalog().leg];
    expected.sort();
    assert_eq!(requested, expected);
}

#[test]
fn begin_initial_load_twice_is_noop() {
    let mut desk = configurator(GatedLoader::default());
    desk.begin_initial_load();
    desk.begin_initial_load();
    assert_eq!(desk.pending_loads(), 3);
}

#[test]
fn ready_only_after_every_slot_attached() {
    let mut desk = configurator(GatedLoader::default());
    desk.begin_initial_load();
    desk.pump();

    desk.loader().resolve(&material(0));
    desk.loader().resolve(&catalog().leg);
    desk.pump();
    assert_eq!(desk.lifecycle(), Lifecycle::Loading);

    desk.loader().resolve(&support(0));
    desk.pump();
    assert_eq!(desk.lifecycle(), Lifecycle::Ready);
}

#[test]
fn mutations_before_initial_load_shape_the_first_assembly() {
    let mut desk = configurator(GatedLoader::default());
    desk.set_desk_width(2400).unwrap();
    desk.set_material(3).unwrap();
    assert_eq!(desk.pending_loads(), 0);

    desk.begin_initial_load();
    desk.pump();
    assert!(desk.loader().pending().contains(&material(3)));
    desk.loader().resolve_all();
    desk.pump();

    let legs = instances(&desk, Slot::Legs);
    assert!((legs[0].transform.scale.x - 3.12).abs() < EPSILON);
    assert_eq!(template_source(&desk, Slot::Top), material(3).as_str());
}

// ============================================================================
// Transform-Only Changes
// ============================================================================

#[test]
fn width_change_retransforms_legs_and_supports_without_fetching_them() {
    let mut desk = ready_gated();
    let before = desk.loader().requested().len();
    let leg_nodes: Vec<_> = desk
        .scene()
        .children(desk.composer().current(Slot::Legs).unwrap())
        .to_vec();

    desk.set_desk_width(2400).unwrap();

    // Applied before any pump.
    for leg in instances(&desk, Slot::Legs) {
        assert!((leg.transform.scale.x - 3.12).abs() < EPSILON);
    }
    for (node, offset) in instances(&desk, Slot::Supports).iter().zip(SUPPORT_OFFSETS) {
        assert!((node.transform.position.z - offset.z * 2.4).abs() < EPSILON);
    }
    assert!((instances(&desk, Slot::Top)[0].transform.scale.z - 12.0).abs() < EPSILON);

    // Same leg nodes, moved in place.
    assert_eq!(
        desk.scene().children(desk.composer().current(Slot::Legs).unwrap()),
        leg_nodes.as_slice()
    );

    desk.pump();
    let requested = desk.loader().requested();
    assert_eq!(&requested[before..], &[material(0)]);
}

#[test]
fn leg_height_change_issues_no_fetch() {
    let mut desk = ready_gated();
    let before = desk.loader().requested().len();

    desk.set_leg_height(1200).unwrap();
    desk.pump();

    assert_eq!(desk.pending_loads(), 0);
    assert_eq!(desk.loader().requested().len(), before);
    for leg in instances(&desk, Slot::Legs) {
        assert!((leg.transform.scale.y - 1.2).abs() < EPSILON);
    }
    for node in instances(&desk, Slot::Supports) {
        assert!((node.transform.position.y + 0.59).abs() < EPSILON);
    }
}

#[test]
fn depth_change_leaves_legs_and_supports_untouched() {
    let mut desk = ready_gated();
    let legs_before: Vec<Vec3> = instances(&desk, Slot::Legs)
        .iter()
        .map(|n| n.transform.scale)
        .collect();

    desk.set_desk_depth(900).unwrap();

    let legs_after: Vec<Vec3> = instances(&desk, Slot::Legs)
        .iter()
        .map(|n| n.transform.scale)
        .collect();
    assert_eq!(legs_before, legs_after);
    assert!((instances(&desk, Slot::Top)[0].transform.scale.y - 0.45).abs() < EPSILON);
}

// ============================================================================
// Reload Races
// ============================================================================

#[test]
fn latest_material_wins_when_older_resolves_last() {
    let mut desk = ready_gated();

    desk.set_material(2).unwrap();
    desk.pump();
    desk.set_material(4).unwrap();
    desk.pump();

    desk.loader().resolve(&material(4));
    desk.pump();
    assert_eq!(template_source(&desk, Slot::Top), material(4).as_str());

    desk.loader().resolve(&material(2));
    desk.pump();
    assert_eq!(template_source(&desk, Slot::Top), material(4).as_str());
    assert_eq!(instances(&desk, Slot::Top).len(), 1);

    let events = desk.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        ConfiguratorEvent::StaleDiscarded { slot: Slot::Top, .. }
    )));
}

#[test]
fn latest_material_wins_when_older_resolves_first() {
    let mut desk = ready_gated();
    let original = desk.composer().current(Slot::Top).unwrap();

    desk.set_material(2).unwrap();
    desk.pump();
    desk.set_material(4).unwrap();
    desk.pump();

    desk.loader().resolve(&material(2));
    desk.pump();
    // The superseded result never reaches the scene.
    assert_eq!(desk.composer().current(Slot::Top), Some(original));

    desk.loader().resolve(&material(4));
    desk.pump();
    assert_eq!(template_source(&desk, Slot::Top), material(4).as_str());
    assert!(!desk.scene().contains(original));
}

#[test]
fn replaced_top_uses_dimensions_current_at_completion() {
    let mut desk = ready_gated();

    desk.set_material(1).unwrap();
    desk.pump();
    desk.set_desk_depth(300).unwrap();
    desk.pump();

    // The depth change superseded the material request with its own.
    desk.loader().resolve_all();
    desk.pump();

    let top = instances(&desk, Slot::Top);
    assert_eq!(top.len(), 1);
    assert!((top[0].transform.scale.y - 0.15).abs() < EPSILON);
    assert_eq!(template_source(&desk, Slot::Top), material(1).as_str());
}

#[test]
fn supports_replaced_exactly_once() {
    let mut desk = ready_gated();
    let old = desk.composer().current(Slot::Supports).unwrap();
    let nodes_before = desk.scene().node_count();

    desk.set_support_variant(1).unwrap();
    desk.pump();
    desk.loader().resolve(&support(1));
    desk.pump();

    let events = desk.drain_events();
    let replaced: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ConfiguratorEvent::Replaced { old, .. } => Some(*old),
            _ => None,
        })
        .collect();
    assert_eq!(replaced, vec![old]);
    assert!(!desk.scene().contains(old));
    assert_eq!(desk.scene().node_count(), nodes_before);
    assert_eq!(template_source(&desk, Slot::Supports), support(1).as_str());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn failed_support_reload_keeps_previous_variant() {
    let mut desk = ready_gated();
    let previous = desk.composer().current(Slot::Supports).unwrap();

    desk.set_support_variant(1).unwrap();
    desk.pump();
    desk.loader().reject(&support(1));
    desk.pump();

    assert_eq!(desk.composer().current(Slot::Supports), Some(previous));
    assert_eq!(instances(&desk, Slot::Supports).len(), 4);
    assert_eq!(template_source(&desk, Slot::Supports), support(0).as_str());

    let events = desk.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        ConfiguratorEvent::LoadFailed {
            slot: Slot::Supports,
            fallback: Some(node),
            ..
        } if *node == previous
    )));
}

#[test]
fn failed_initial_load_is_unavailable_until_retried() {
    let mut desk = configurator(GatedLoader::default());
    desk.begin_initial_load();
    desk.pump();

    desk.loader().resolve(&material(0));
    desk.loader().resolve(&support(0));
    desk.loader().reject(&catalog().leg);
    desk.pump();

    assert!(matches!(desk.slot_state(Slot::Legs), SlotState::Unavailable(_)));
    assert_eq!(desk.lifecycle(), Lifecycle::Loading);

    assert_eq!(desk.retry_unavailable(), 1);
    assert!(matches!(desk.slot_state(Slot::Legs), SlotState::Loading));
    desk.pump();
    desk.loader().resolve(&catalog().leg);
    desk.pump();

    assert!(desk.is_ready());
    assert_eq!(instances(&desk, Slot::Legs).len(), 2);
}

#[test]
fn stale_failure_does_not_report_fallback() {
    let mut desk = ready_gated();

    desk.set_material(2).unwrap();
    desk.pump();
    desk.set_material(3).unwrap();
    desk.pump();

    desk.loader().reject(&material(2));
    desk.loader().resolve(&material(3));
    desk.pump();

    let events = desk.drain_events();
    assert!(!events.iter().any(|e| matches!(e, ConfiguratorEvent::LoadFailed { .. })));
    assert_eq!(template_source(&desk, Slot::Top), material(3).as_str());
}

// ============================================================================
// Mutation Boundary
// ============================================================================

#[test]
fn out_of_range_values_are_rejected() {
    let mut desk = ready_gated();
    let before = desk.config();

    let err = desk.set_leg_height(1300).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::OutOfRange {
            parameter: Parameter::LegHeight,
            ..
        })
    ));
    assert!(desk.set_desk_width(1199).is_err());
    assert!(desk.set_desk_depth(901).is_err());
    assert!(desk.set_material(5).is_err());
    assert!(desk.set_support_variant(usize::MAX).is_err());

    assert_eq!(desk.config(), before);
    assert_eq!(desk.pending_loads(), 0);
}

#[test]
fn oversized_catalog_index_is_rejected_without_fetch() {
    let mut desk = ready_gated();
    let before = desk.config();
    let requested = desk.loader().requested().len();

    let err = desk.set_material(usize::MAX).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::OutOfRange {
            parameter: Parameter::Material,
            value: i64::MAX,
            max: 4,
            ..
        })
    ));
    let err = desk.set_support_variant(usize::MAX).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::OutOfRange {
            parameter: Parameter::SupportVariant,
            value: i64::MAX,
            ..
        })
    ));
    desk.pump();

    assert_eq!(desk.config(), before);
    assert_eq!(desk.pending_loads(), 0);
    assert_eq!(desk.loader().requested().len(), requested);
}

#[test]
fn setting_current_value_is_a_noop() {
    let mut desk = ready_gated();
    let before = desk.loader().requested().len();

    assert_eq!(desk.set_material(0).unwrap(), None);
    assert_eq!(desk.set(Parameter::DeskWidth, 1200).unwrap(), None);
    desk.pump();

    assert_eq!(desk.loader().requested().len(), before);
}

#[test]
fn accepted_change_reports_previous_and_current() {
    let mut desk = ready_gated();
    let change = desk.set_leg_height(950).unwrap().unwrap();
    assert_eq!(change.parameter, Parameter::LegHeight);
    assert_eq!(change.previous, 800);
    assert_eq!(change.current, 950);
    assert_eq!(desk.config().leg_height_mm(), 950);
}

// ============================================================================
// Async Runtime
// ============================================================================

#[tokio::test(flavor = "current_thread")]
async fn run_until_idle_on_tokio() {
    let mut desk = configurator(memory_loader());
    desk.begin_initial_load();
    desk.run_until_idle().await;
    assert!(desk.is_ready());

    desk.set_support_variant(1).unwrap();
    desk.run_until_idle().await;
    assert_eq!(template_source(&desk, Slot::Supports), support(1).as_str());
}

//! Effect lifecycle: intervals, expiry, stacks, renewal, cures and persistence

mod common;

use afflict::effects::{CureProps, Detached, DamageType, VariantKind};
use afflict::AttributeTree;
use common::{approx, create, def, registry, Recorder};
use serde_json::json;

fn burn_registry() -> std::sync::Arc<afflict::EffectRegistry> {
    registry(vec![
        def(
            "burn",
            VariantKind::Damage,
            json!({ "interval": 5.0, "intensity": 2.0, "damage_type": "fire", "max_stacks": 5 }),
        ),
        def(
            "ward",
            VariantKind::Effect,
            json!({ "duration": 10.0, "expires_over_time": true, "immunity_duration": 30.0 }),
        ),
        def(
            "charge",
            VariantKind::Effect,
            json!({ "max_stacks": 5, "accumulates": true }),
        ),
    ])
}

#[test]
fn test_interval_keeps_phase() {
    let registry = burn_registry();
    let mut burn = create(&registry, "burn");
    let mut host = Recorder::default();
    burn.on_start(&mut host);

    assert!(!burn.on_tick(3.0, &mut host));
    assert!(burn.on_tick(3.0, &mut host));
    assert_eq!(burn.last_triggered(), 5.0);
    assert_eq!(host.damage, vec![(2.0, DamageType::Fire)]);

    // runtime 9, next boundary is 10
    assert!(!burn.on_tick(3.0, &mut host));
    assert!(burn.on_tick(3.0, &mut host));
    assert_eq!(burn.last_triggered(), 10.0);
    assert_eq!(host.damage.len(), 2);
}

#[test]
fn test_expires_over_time() {
    let registry = burn_registry();
    let mut ward = create(&registry, "ward");
    ward.on_start(&mut Detached);

    for _ in 0..999 {
        ward.on_tick(0.01, &mut Detached);
    }
    assert!(ward.runtime() < 10.0);
    assert!(!ward.should_expire());

    ward.on_tick(0.02, &mut Detached);
    assert!(ward.should_expire());

    let mut host = Recorder::default();
    ward.on_expires(&mut host);
    assert_eq!(host.immunities, vec![("ward".to_string(), 30.0)]);
    assert!(!ward.is_running());
}

#[test]
fn test_expires_through_intensity() {
    let registry = burn_registry();
    let mut burn = create(&registry, "burn");
    let mut flags = burn.flags();
    flags.through_intensity = true;
    burn.set_flags(flags);
    burn.on_start(&mut Detached);
    assert!(!burn.should_expire());

    burn.update(0.0, None, &mut Detached);
    assert!(burn.should_expire());
}

#[test]
fn test_stack_clamp() {
    let registry = burn_registry();
    let mut burn = create(&registry, "burn");

    burn.set_stacks(9);
    assert_eq!(burn.stacks(), 5);
    burn.set_stacks(-3);
    assert_eq!(burn.stacks(), 1);

    burn.set_stacks(4);
    burn.set_max_stacks(0);
    assert_eq!(burn.max_stacks(), 1);
    assert_eq!(burn.stacks(), 1);
}

#[test]
fn test_renewal_averages_by_stacks() {
    let registry = burn_registry();
    let mut a = create(&registry, "burn");
    let mut b = create(&registry, "burn");
    a.update(10.0, Some(1), &mut Detached);
    b.update(20.0, Some(1), &mut Detached);
    a.on_start(&mut Detached);

    a.on_renewed(b, &mut Detached);
    assert_eq!(a.stacks(), 2);
    assert!(approx(a.intensity(), 15.0));
    assert_eq!(a.runtime(), 0.0);
}

#[test]
fn test_renewal_accumulates() {
    let registry = burn_registry();
    let mut a = create(&registry, "charge");
    let mut b = create(&registry, "charge");
    a.update(10.0, Some(1), &mut Detached);
    b.update(20.0, Some(1), &mut Detached);
    a.on_start(&mut Detached);

    a.on_renewed(b, &mut Detached);
    assert_eq!(a.stacks(), 2);
    assert!(approx(a.intensity(), 30.0));
}

#[test]
fn test_renewal_weights_by_duration() {
    let registry = burn_registry();
    let mut a = create(&registry, "burn");
    let mut b = create(&registry, "burn");
    a.set_duration(10.0);
    b.set_duration(30.0);
    a.update(10.0, Some(1), &mut Detached);
    b.update(20.0, Some(1), &mut Detached);

    a.on_start(&mut Detached);
    a.on_tick(7.0, &mut Detached);
    assert_eq!(a.last_triggered(), 5.0);

    a.on_renewed(b, &mut Detached);
    // (10*10 + 20*30) / (10 + 30)
    assert!(approx(a.intensity(), 17.5));
    assert_eq!(a.duration(), 30.0);
    assert_eq!(a.last_triggered(), -2.0);
    assert_eq!(a.runtime(), 0.0);
}

#[test]
fn test_cure_respects_floors() {
    let registry = burn_registry();
    let mut burn = create(&registry, "burn");
    burn.set_duration(20.0);
    burn.on_start(&mut Detached);

    let cure = CureProps {
        intensity: 1_000.0,
        duration: 1_000.0,
        min_intensity: 0.5,
        min_duration: 4.0,
        ..CureProps::default()
    };
    let mut host = Recorder::default();
    assert!(burn.on_cured(&cure, 50.0, &mut host));
    assert_eq!(burn.intensity(), 0.5);
    assert_eq!(burn.duration(), 4.0);
    assert!(host.dirty > 0);

    // Nothing left to take
    assert!(!burn.on_cured(&cure, 50.0, &mut host));
    assert_eq!(burn.intensity(), 0.5);
}

#[test]
fn test_cure_divides_by_stacks() {
    let registry = burn_registry();
    let mut burn = create(&registry, "burn");
    burn.update(4.0, Some(4), &mut Detached);

    let cure = CureProps {
        intensity: 2.0,
        ..CureProps::default()
    };
    assert!(burn.on_cured(&cure, 1.0, &mut Detached));
    assert!(approx(burn.intensity(), 3.5));
}

#[test]
fn test_tree_round_trip() {
    let registry = burn_registry();
    let mut burn = create(&registry, "burn");
    burn.set_duration(12.0);
    burn.set_immunity_duration(3.0);
    burn.update(2.5, Some(3), &mut Detached);
    burn.on_start(&mut Detached);
    burn.on_tick(6.0, &mut Detached);

    let tree = burn.to_tree();
    let mut restored = create(&registry, "burn");
    restored.from_tree(&tree, &mut Detached);

    assert_eq!(restored.duration(), 12.0);
    assert_eq!(restored.interval(), 5.0);
    assert_eq!(restored.stacks(), 3);
    assert_eq!(restored.intensity(), 2.5);
    assert_eq!(restored.runtime(), 6.0);
    assert_eq!(restored.last_triggered(), 5.0);
    assert_eq!(restored.flags(), burn.flags());
    assert_eq!(restored.immunity_duration(), 3.0);
    assert!(!restored.is_running());
    assert_eq!(restored.to_tree(), tree);
}

#[test]
fn test_partial_tree_keeps_defaults() {
    let registry = burn_registry();
    let mut burn = create(&registry, "burn");
    let mut tree = AttributeTree::new();
    tree.set_string("intensity", "lots");
    tree.set_int("stacks", 2);
    burn.from_tree(&tree, &mut Detached);

    assert_eq!(burn.intensity(), 2.0);
    assert_eq!(burn.stacks(), 2);
    assert_eq!(burn.interval(), 5.0);
}

#[test]
fn test_running_effect_reloads_through_update() {
    let registry = burn_registry();
    let mut burn = create(&registry, "burn");
    burn.on_start(&mut Detached);

    let mut tree = burn.to_tree();
    tree.set_float("intensity", 6.0);
    let mut host = Recorder::default();
    burn.from_tree(&tree, &mut host);
    assert_eq!(burn.intensity(), 6.0);
    assert!(host.dirty > 0);
}

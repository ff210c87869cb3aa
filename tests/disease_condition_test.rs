//! Conditions and diseases: child cascades, symptoms, healing and cures

mod common;

use std::sync::Arc;

use afflict::effects::{
    ChanceTrigger, CureProps, Detached, EffectRegistryBuilder, VariantKind, DISEASE_TRIGGER,
};
use afflict::EffectRegistry;
use common::{approx, catalog, create, def, registry, Recorder};
use serde_json::json;

fn malady_defaults() -> serde_json::Value {
    json!({
        "interval": 1.0,
        "intensity": 0.1,
        "healing_rate": 0.1,
        "healing_growth": 0.05,
        "max_healing_rate": 0.5,
        "max_healing_growth": 0.2,
        "symptoms": {
            "ache": { "threshold": 0.5, "max_intensity": 1.0 }
        }
    })
}

fn malady_registry() -> Arc<EffectRegistry> {
    registry(vec![
        def("ache", VariantKind::Effect, json!({ "intensity": 0.0 })),
        def("malady", VariantKind::Disease, malady_defaults()),
    ])
}

#[test]
fn test_symptom_threshold() {
    let registry = malady_registry();
    let mut malady = create(&registry, "malady");
    malady.on_start(&mut Detached);

    malady.update(0.4, None, &mut Detached);
    assert!(!malady.as_disease().unwrap().condition().contains("ache"));

    malady.update(0.6, None, &mut Detached);
    let ache = malady.as_disease().unwrap().condition().child("ache").unwrap();
    assert!(approx(ache.intensity(), 0.2));
    assert!(ache.is_running());

    // Exactly at the threshold the symptom stays, at zero strength
    malady.update(0.5, None, &mut Detached);
    assert!(approx(malady.child_intensity("ache"), 0.0));
    assert!(malady.as_disease().unwrap().condition().contains("ache"));

    malady.update(0.49, None, &mut Detached);
    assert!(!malady.as_disease().unwrap().condition().contains("ache"));
}

#[test]
fn test_healing_decays_and_grows() {
    let registry = malady_registry();
    let mut malady = create(&registry, "malady");
    malady.update(0.5, None, &mut Detached);
    malady.on_start(&mut Detached);

    assert!(malady.on_tick(1.5, &mut Detached));
    assert!(approx(malady.intensity(), 0.4));
    assert!(approx(malady.as_disease().unwrap().healing_rate(), 0.15));

    assert!(malady.on_tick(1.0, &mut Detached));
    assert!(approx(malady.intensity(), 0.25));
    assert!(approx(malady.as_disease().unwrap().healing_rate(), 0.2));
}

#[test]
fn test_recovering_trigger_stops_growth() {
    let mut builder = EffectRegistryBuilder::new();
    builder
        .register(def("ache", VariantKind::Effect, json!({})))
        .unwrap();
    builder
        .register(def("malady", VariantKind::Disease, malady_defaults()))
        .unwrap();
    let trigger = ChanceTrigger::seeded(1)
        .with_base_chance(0.9)
        .with_recovery_threshold(0.5);
    builder.register_trigger("malady", DISEASE_TRIGGER, Arc::new(trigger));
    let registry = builder.build();

    let mut malady = create(&registry, "malady");
    malady.update(0.5, None, &mut Detached);
    malady.on_start(&mut Detached);
    assert!(malady.as_disease().unwrap().trigger().is_some());

    malady.on_tick(1.5, &mut Detached);
    assert!(approx(malady.intensity(), 0.4));
    assert!(approx(malady.as_disease().unwrap().healing_rate(), 0.1));
}

#[test]
fn test_disease_cure_channels_are_capped() {
    let registry = malady_registry();
    let mut malady = create(&registry, "malady");
    malady.update(0.8, None, &mut Detached);
    malady.on_start(&mut Detached);

    let cure = CureProps {
        intensity: 0.3,
        min_intensity: 0.6,
        healing_rate: 1.0,
        max_healing_rate: 0.3,
        healing_growth: 1.0,
        max_healing_growth: 5.0,
        ..CureProps::default()
    };
    let mut host = Recorder::default();
    assert!(malady.on_cured(&cure, 1.0, &mut host));

    let disease = malady.as_disease().unwrap();
    assert!(approx(malady.intensity(), 0.6));
    assert!(approx(disease.healing_rate(), 0.3));
    // Capped by the disease's own max
    assert!(approx(disease.healing_growth(), 0.2));
}

#[test]
fn test_condition_cascades_max_stacks() {
    let registry = catalog();
    let mut exhaustion = create(&registry, "exhaustion");
    let condition = exhaustion.as_condition().unwrap();
    assert!(condition.synchronized_max_stacks());
    for child in condition.children() {
        assert_eq!(child.max_stacks(), 3);
    }

    exhaustion.set_max_stacks(2);
    exhaustion.set_stacks(2);
    for child in exhaustion.as_condition().unwrap().children() {
        assert_eq!(child.max_stacks(), 2);
        assert_eq!(child.stacks(), 2);
    }
}

#[test]
fn test_condition_update_rescales_children() {
    let registry = catalog();
    let mut exhaustion = create(&registry, "exhaustion");
    exhaustion.on_start(&mut Detached);
    assert!(approx(exhaustion.child_intensity("slow"), 0.2));

    exhaustion.update(2.0, None, &mut Detached);
    assert!(approx(exhaustion.child_intensity("slow"), 0.4));
    assert!(approx(exhaustion.child_intensity("mining_speed"), -0.6));
    assert_eq!(exhaustion.child_intensity("missing"), 0.0);
}

#[test]
fn test_condition_renewal_merges_children() {
    let registry = catalog();
    let mut a = create(&registry, "exhaustion");
    let mut b = create(&registry, "exhaustion");
    b.set_child_intensity("slow", 0.6, &mut Detached);
    a.on_start(&mut Detached);

    a.on_renewed(b, &mut Detached);
    assert_eq!(a.stacks(), 2);
    let slow = a.child_intensity("slow");
    assert!(slow > 0.2 && slow < 0.6, "slow = {}", slow);
    assert_eq!(a.as_condition().unwrap().len(), 2);
}

#[test]
fn test_condition_children_round_trip() {
    let registry = catalog();
    let mut exhaustion = create(&registry, "exhaustion");
    exhaustion.set_child_intensity("slow", 0.7, &mut Detached);
    let tree = exhaustion.to_tree();
    assert!(tree.get_tree("effects").unwrap().contains("slow"));

    let mut restored = create(&registry, "exhaustion");
    restored.from_tree(&tree, &mut Detached);
    assert!(approx(restored.child_intensity("slow"), 0.7));
    assert!(approx(restored.child_intensity("mining_speed"), -0.3));
}

#[test]
fn test_disease_round_trip_keeps_symptoms() {
    let registry = malady_registry();
    let mut malady = create(&registry, "malady");
    malady.update(0.75, None, &mut Detached);
    malady.on_start(&mut Detached);
    malady.on_tick(1.5, &mut Detached);

    let tree = malady.to_tree();
    let mut restored = create(&registry, "malady");
    restored.from_tree(&tree, &mut Detached);

    let original = malady.as_disease().unwrap();
    let disease = restored.as_disease().unwrap();
    assert!(approx(restored.intensity(), malady.intensity()));
    assert_eq!(disease.healing_rate(), original.healing_rate());
    assert_eq!(disease.last_healing_trigger(), original.last_healing_trigger());
    assert_eq!(disease.symptoms(), original.symptoms());
}

#[test]
fn test_description_falls_back_to_template() {
    let mut bad = def("odd", VariantKind::Effect, json!({}));
    bad.description = "Strength {5}".to_string();
    let registry = registry(vec![bad]);
    assert_eq!(create(&registry, "odd").description(), "Strength {5}");

    let poison = create(&catalog(), "poison");
    assert_eq!(poison.description(), "Deals 1.0 poison damage every 1s");
}

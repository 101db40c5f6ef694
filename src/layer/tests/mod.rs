mod lighting;

use crate::scene::PayloadKind;

use super::BuildLayer;

#[test]
fn layers_are_found_by_key_or_label() {
    assert_eq!(BuildLayer::find("models").unwrap().label, "Modelling");
    assert_eq!(BuildLayer::find("lighting").unwrap().storage_key, "lights");
    assert!(BuildLayer::find("fx").is_none());
}

#[test]
fn pipeline_order_is_fixed() {
    let keys: Vec<&str> = BuildLayer::all().iter().map(|l| l.storage_key).collect();
    assert_eq!(
        keys,
        vec!["models", "materials", "grooms", "rigs", "assembly", "anims", "lights"]
    );

    assert_eq!(BuildLayer::find("anims").unwrap().order(), 5);
}

#[test]
fn shape_keys_trigger_several_layers() {
    let triggered: Vec<&str> = BuildLayer::all()
        .iter()
        .filter(|layer| layer.is_triggered_by(&[PayloadKind::ShapeKeys]))
        .map(|layer| layer.storage_key)
        .collect();

    assert_eq!(triggered, vec!["models", "rigs", "anims"]);
    assert!(BuildLayer::find("materials").unwrap().owns_materials());
    assert!(!BuildLayer::find("models").unwrap().owns_materials());
}

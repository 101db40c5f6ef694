use glam::{Mat4, Vec3};
use uuid::Uuid;

use crate::{
    fixtures::{add, container, mesh_leaf, quad_strip, tag_for, ASSET},
    layer::{BuildLayer, TransferSettings},
    scene::{
        Driver, DriverTarget, DriverVariable, Leaf, LeafData, LightData, LightKind, Node,
        ParentBinding, ParentKind, Scene, VariableKind, World,
    },
};

fn light(name: &str, uuid: Uuid, energy: f32) -> Node {
    let data = LightData {
        kind: LightKind::Area,
        color: Vec3::ONE,
        energy,
        radius: 0.5,
        spot_size: 0.0,
        spot_blend: 0.0,
        use_shadow: true,
        specular_factor: 1.0,
    };

    Node::leaf(name, Leaf::new(LeafData::Light(data))).tagged(tag_for(uuid))
}

fn world(strength: f32) -> World {
    World {
        name: "Studio".to_owned(),
        color: Vec3::splat(0.05),
        strength,
        environment_image: Some("studio.hdr".to_owned()),
        mist_start: 0.0,
        mist_depth: 25.0,
    }
}

#[test]
fn lights_are_added_removed_and_updated() {
    let _ = env_logger::try_init();

    let hero = Uuid::new_v4();
    let body = Uuid::new_v4();
    let key = Uuid::new_v4();

    let mut workspace = Scene::new("workspace");
    let w_hero = add(&mut workspace, None, container("Hero", hero));
    let w_body = add(&mut workspace, Some(w_hero), mesh_leaf("Body", body, quad_strip()));
    let w_key = add(&mut workspace, Some(w_hero), light("Key", key, 10.0));
    let w_fill = add(&mut workspace, Some(w_hero), light("Fill", Uuid::new_v4(), 5.0));
    workspace.world = Some(world(1.0));

    let mut snapshot = Scene::new("snapshot");
    let s_hero = add(&mut snapshot, None, container("Hero", hero));
    let s_body = add(&mut snapshot, Some(s_hero), mesh_leaf("Body", body, quad_strip()));
    let s_key = add(&mut snapshot, Some(s_hero), light("Key", key, 50.0));
    let s_rig = add(&mut snapshot, Some(s_hero), container("Light Rig", Uuid::new_v4()));
    let s_rim = add(&mut snapshot, Some(s_rig), light("Rim", Uuid::new_v4(), 20.0));
    snapshot.world = Some(world(0.5));

    {
        let key = snapshot.leaf_mut(s_key).unwrap();
        key.transform = Mat4::from_translation(Vec3::new(3.0, 0.0, 4.0));
        key.parent = Some(ParentBinding {
            target: Some(s_body),
            kind: ParentKind::Object,
            bone: String::new(),
            inverse: Mat4::IDENTITY,
        });

        let mut driver = Driver::scaffold("data.energy", None);
        driver.variables = vec![DriverVariable {
            name: "height".to_owned(),
            kind: VariableKind::SingleProp,
            targets: vec![DriverTarget {
                id: Some(s_body),
                data_path: "location.z".to_owned(),
                ..Default::default()
            }],
        }];
        key.drivers.push(driver);
    }

    // Modelling data in a lighting snapshot is never touched.
    snapshot.leaf_mut(s_body).unwrap().transform = Mat4::from_scale(Vec3::splat(3.0));

    let layer = BuildLayer::find("lights").unwrap();
    let report = layer.apply(&mut workspace, snapshot, ASSET, &TransferSettings::default());

    assert_eq!(report.added, 1);
    assert_eq!(report.removed, 1);
    assert_eq!(report.matched, 1);

    assert!(!workspace.tree.contains(w_fill));

    let rim = workspace.tree.get(s_rim).unwrap();
    let rig = workspace.tree.get(rim.parent().unwrap()).unwrap();
    assert_eq!(rig.name, "Light Rig");
    assert_eq!(rig.parent(), Some(w_hero));

    let key = workspace.leaf(w_key).unwrap();
    match &key.data {
        LeafData::Light(data) => assert_eq!(data.energy, 50.0),
        other => panic!("expected a light, got {:?}", other),
    }
    assert_eq!(key.transform, Mat4::from_translation(Vec3::new(3.0, 0.0, 4.0)));
    assert_eq!(key.parent.as_ref().unwrap().target, Some(w_body));
    assert_eq!(key.drivers.len(), 1);
    assert_eq!(key.drivers[0].variables[0].targets[0].id, Some(w_body));

    assert_eq!(workspace.leaf(w_body).unwrap().transform, Mat4::IDENTITY);
    assert_eq!(workspace.world.as_ref().unwrap().strength, 0.5);
}

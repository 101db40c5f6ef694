use crate::scene::{Driver, DriverVariable, Leaf};

use super::RefMap;

/// Copies every driver of `source` onto `target`, replacing whatever the
/// target had driving the same property.
pub fn transfer_drivers(target: &mut Leaf, source: &Leaf, refs: &RefMap) {
    for driver in &source.drivers {
        let copy = copy_driver(driver, refs);

        let existing = target
            .drivers
            .iter_mut()
            .find(|d| d.data_path == copy.data_path && d.array_index == copy.array_index);

        match existing {
            Some(existing) => *existing = copy,
            None => target.drivers.push(copy),
        }
    }
}

/// Builds a copy of `from` on a freshly scaffolded driver.
///
/// The scaffold's default variable and generator are cleared first, so the
/// result carries exactly the source's modifiers and variables. Target ids
/// are resolved once everything is copied.
pub fn copy_driver(from: &Driver, refs: &RefMap) -> Driver {
    let mut driver = Driver::scaffold(from.data_path.clone(), from.array_index);
    driver.modifiers.clear();
    driver.variables.clear();

    driver.kind = from.kind;
    driver.expression.clone_from(&from.expression);
    driver.use_self = from.use_self;
    driver.modifiers.extend(from.modifiers.iter().cloned());

    for variable in &from.variables {
        let mut copy = DriverVariable::new(variable.name.clone(), variable.kind);

        for (to, original) in copy.targets.iter_mut().zip(&variable.targets) {
            to.id = original.id;
            to.data_path.clone_from(&original.data_path);
            to.bone_target.clone_from(&original.bone_target);
            to.transform_type.clone_from(&original.transform_type);
            to.transform_space.clone_from(&original.transform_space);
        }

        if variable.targets.len() != copy.targets.len() {
            log::warn!(
                "Driver variable {} on {} has {} targets, expected {}",
                variable.name,
                from.data_path,
                variable.targets.len(),
                copy.targets.len()
            );
        }

        driver.variables.push(copy);
    }

    for target in driver.targets_mut() {
        target.id = refs.resolve(target.id);
    }

    driver
}

#[cfg(test)]
mod test {
    use uuid::Uuid;

    use super::*;

    use crate::{
        fixtures::{add, empty_leaf, ASSET},
        reconcile::{compute_match_table, MatchedPair},
        scene::{
            CurveModifier, CurveModifierKind, DriverKind, DriverTarget, LeafData, NodeId, Scene,
            VariableKind,
        },
    };

    fn source_driver(owner: NodeId, rig: NodeId) -> Driver {
        Driver {
            data_path: "shape_keys[\"Smile\"].value".to_owned(),
            array_index: None,
            kind: DriverKind::Scripted,
            expression: "jaw * 2 + self.location.z".to_owned(),
            use_self: true,
            modifiers: vec![CurveModifier::new(CurveModifierKind::Limits)],
            variables: vec![
                DriverVariable {
                    name: "jaw".to_owned(),
                    kind: VariableKind::Transforms,
                    targets: vec![DriverTarget {
                        id: Some(rig),
                        bone_target: "jaw".to_owned(),
                        transform_type: "ROT_X".to_owned(),
                        transform_space: "LOCAL_SPACE".to_owned(),
                        ..Default::default()
                    }],
                },
                DriverVariable {
                    name: "me".to_owned(),
                    kind: VariableKind::SingleProp,
                    targets: vec![DriverTarget {
                        id: Some(owner),
                        data_path: "location.x".to_owned(),
                        ..Default::default()
                    }],
                },
            ],
        }
    }

    #[test]
    fn drivers_are_copied_without_scaffolding() {
        let _ = env_logger::try_init();

        let face_uuid = Uuid::new_v4();
        let rig_uuid = Uuid::new_v4();

        let mut workspace = Scene::new("workspace");
        let w_face = add(&mut workspace, None, empty_leaf("Face", face_uuid));
        let w_rig = add(&mut workspace, None, empty_leaf("Rig", rig_uuid));

        let mut snapshot = Scene::new("snapshot");
        let s_face = add(&mut snapshot, None, empty_leaf("Face", face_uuid));
        let s_rig = add(&mut snapshot, None, empty_leaf("Rig", rig_uuid));

        let table = compute_match_table(&workspace.tree, &snapshot.tree, ASSET, false);
        let refs = RefMap::new(
            &table,
            MatchedPair {
                target: w_face,
                source: s_face,
            },
        );

        let mut source = Leaf::new(LeafData::Empty);
        source.drivers = vec![source_driver(s_face, s_rig)];

        let mut target = Leaf::new(LeafData::Empty);
        target
            .drivers
            .push(Driver::scaffold("shape_keys[\"Smile\"].value", None));
        target.drivers.push(Driver::scaffold("location", Some(1)));

        transfer_drivers(&mut target, &source, &refs);

        assert_eq!(target.drivers.len(), 2);

        let smile = &target.drivers[0];
        assert_eq!(smile.expression, "jaw * 2 + self.location.z");
        assert!(smile.use_self);
        assert_eq!(smile.modifiers, vec![CurveModifier::new(CurveModifierKind::Limits)]);
        assert_eq!(smile.variables.len(), 2);

        let jaw = &smile.variables[0].targets[0];
        assert_eq!(jaw.id, Some(w_rig));
        assert_eq!(jaw.bone_target, "jaw");
        assert_eq!(jaw.transform_type, "ROT_X");

        assert_eq!(smile.variables[1].targets[0].id, Some(w_face));
        assert_eq!(smile.variables[1].targets[0].data_path, "location.x");

        assert_eq!(target.drivers[1].data_path, "location");
    }
}

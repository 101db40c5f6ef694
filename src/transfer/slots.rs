use std::collections::BTreeMap;

use crate::scene::{Leaf, Material};

/// Makes the target's material slots a copy of the source's: the list is
/// truncated or grown to the source's length, slots are copied index by
/// index, and the active slot is copied last.
///
/// Materials the slots point at are copied from the source library into the
/// target library, replacing same-named ones.
pub fn transfer_material_slots(
    target: &mut Leaf,
    target_materials: &mut BTreeMap<String, Material>,
    source: &Leaf,
    source_materials: &BTreeMap<String, Material>,
) {
    target.material_slots.truncate(source.material_slots.len());
    target
        .material_slots
        .resize_with(source.material_slots.len(), Default::default);

    for (to, from) in target.material_slots.iter_mut().zip(&source.material_slots) {
        to.link = from.link;
        to.material.clone_from(&from.material);

        if let Some(name) = &from.material {
            match source_materials.get(name) {
                Some(material) => {
                    target_materials.insert(name.clone(), material.clone());
                }
                None if !target_materials.contains_key(name) => {
                    log::warn!("Material {} is used by a slot but missing from the snapshot", name);
                }
                None => {}
            }
        }
    }

    target.active_material = source.active_material;
}

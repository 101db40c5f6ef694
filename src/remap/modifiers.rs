use crate::scene::{BindData, Leaf, Modifier, ParamValue};

use super::RefMap;

/// Brings the target's modifier stack in line with the source's.
///
/// Modifiers are matched by name. Ones missing on the target are created
/// right after wherever the source's previous modifier sits on the target,
/// so relative order survives even when the target has extra modifiers of
/// its own. Then every same-named pair has its settings copied over.
pub fn transfer_modifiers(target: &mut Leaf, source: &Leaf, refs: &RefMap) {
    for (index, modifier) in source.modifiers.iter().enumerate() {
        if position_of(target, &modifier.name).is_some() {
            continue;
        }

        let insert_at = index
            .checked_sub(1)
            .and_then(|previous| position_of(target, &source.modifiers[previous].name))
            .map_or(0, |position| position + 1);

        log::debug!("Adding modifier {} at position {}", modifier.name, insert_at);

        target
            .modifiers
            .insert(insert_at, Modifier::new(modifier.name.clone(), modifier.kind.clone()));
    }

    let vertex_count = target.vertex_count();

    for from in &source.modifiers {
        let to = match target.modifiers.iter_mut().find(|m| m.name == from.name) {
            Some(to) => to,
            None => continue,
        };

        if to.kind != from.kind {
            log::warn!(
                "Modifier {} is {:?} on the target but {:?} in the snapshot, leaving it alone",
                from.name,
                to.kind,
                from.kind
            );
            continue;
        }

        let was_bound = to.bind.is_some() || from.bind.is_some();

        to.show_viewport = from.show_viewport;
        to.show_render = from.show_render;
        to.params.clone_from(&from.params);

        for value in to.params.values_mut() {
            if let ParamValue::Node(slot) = value {
                *slot = refs.resolve(*slot);
            }
        }

        if to.kind.binds() && was_bound {
            to.bind = None;
            bind(to, vertex_count);
        }
    }
}

/// Refreshes the bind cache of every bound modifier on a leaf, for example
/// after its geometry was replaced.
pub fn rebind_modifiers(leaf: &mut Leaf) {
    let vertex_count = leaf.vertex_count();

    for modifier in &mut leaf.modifiers {
        if modifier.kind.binds() && modifier.bind.take().is_some() {
            bind(modifier, vertex_count);
        }
    }
}

fn bind(modifier: &mut Modifier, vertex_count: usize) {
    let target = match modifier.params.get("target") {
        Some(ParamValue::Node(target)) => *target,
        _ => modifier.node_params().next(),
    };

    if target.is_none() && modifier.kind.binds_to_target() {
        log::warn!("Modifier {} has nothing to bind to, leaving it unbound", modifier.name);
        return;
    }

    log::trace!("Rebinding modifier {}", modifier.name);

    modifier.bind = Some(BindData {
        target,
        vertex_count,
    });
}

fn position_of(leaf: &Leaf, name: &str) -> Option<usize> {
    leaf.modifiers.iter().position(|m| m.name == name)
}

use crate::scene::{Constraint, ConstraintKind, Leaf};

use super::RefMap;

/// Copies constraints by name, creating the ones the target lacks.
///
/// An armature constraint whose target can't be resolved falls back to
/// whatever the leaf is parented to, which is nearly always the rig.
pub fn transfer_constraints(target: &mut Leaf, source: &Leaf, refs: &RefMap) {
    for from in &source.constraints {
        let index = match target.constraints.iter().position(|c| c.name == from.name) {
            Some(index) => index,
            None => {
                target.constraints.push(Constraint {
                    name: from.name.clone(),
                    kind: from.kind.clone(),
                    enabled: true,
                    targets: Vec::new(),
                });
                target.constraints.len() - 1
            }
        };

        let to = &mut target.constraints[index];

        if to.kind != from.kind {
            log::warn!(
                "Constraint {} changed kind from {:?} to {:?}",
                from.name,
                to.kind,
                from.kind
            );
            to.kind = from.kind.clone();
        }

        to.enabled = from.enabled;
        to.targets = from.targets.iter().map(|id| refs.resolve(*id)).collect();
    }

    apply_armature_fallback(target);
}

/// Copies the parent binding of `source`, pointed at the workspace.
pub fn copy_parenting(target: &mut Leaf, source: &Leaf, refs: &RefMap) {
    target.parent = source.parent.clone().map(|mut binding| {
        binding.target = refs.resolve(binding.target);
        binding
    });
}

fn apply_armature_fallback(leaf: &mut Leaf) {
    let fallback = leaf.parent.as_ref().and_then(|binding| binding.target);

    for constraint in &mut leaf.constraints {
        if constraint.kind != ConstraintKind::Armature {
            continue;
        }

        if constraint.targets.is_empty() {
            constraint.targets.push(None);
        }

        for slot in constraint.targets.iter_mut().filter(|slot| slot.is_none()) {
            log::debug!(
                "Armature constraint {} has no target, using the parent",
                constraint.name
            );
            *slot = fallback;
        }
    }
}

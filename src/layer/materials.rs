use crate::transfer::{
    activate_preview_textures, transfer_material_slots, transfer_surfacing, GeometrySource,
};

use super::{sync_version, LayerReport, TransferSession};

/// Only matched leaves take part. Each gets the snapshot's material slots,
/// the materials those slots use, and its surfacing data.
pub(super) fn apply(session: &mut TransferSession) -> LayerReport {
    let mut report = LayerReport::default();

    let pairs = session.table.pairs().to_vec();

    for pair in pairs {
        let source = match session.snapshot.leaf(pair.source) {
            Some(leaf) => leaf,
            None => continue,
        };

        let workspace = &mut *session.workspace;
        let target = match workspace.tree.get_mut(pair.target).and_then(|n| n.as_leaf_mut()) {
            Some(leaf) => leaf,
            None => continue,
        };

        report.matched += 1;

        transfer_material_slots(
            target,
            &mut workspace.materials,
            source,
            &session.snapshot.materials,
        );

        let path = transfer_surfacing(target, &GeometrySource::new(source));
        report.record(path);

        activate_preview_textures(&mut workspace.materials, &target.material_slots);

        sync_version(session, pair);
    }

    report
}

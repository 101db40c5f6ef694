use std::collections::BTreeMap;

use crate::scene::{CornerLayer, Material, MaterialSlot, Mesh, ShaderNodeKind};

/// Picks active and render layers on a mesh whose layers were just replaced.
///
/// The render UV follows the source's by name. For editing, a UV layer named
/// "Baking" wins, then one named "UVMap", and a colour layer named "PREVIEW"
/// wins. Anything else falls back to the source's active layer by name.
pub fn apply_active_layers(target: &mut Mesh, source: &Mesh) {
    target.render_uv = follow_by_name(&target.uv_layers, &source.uv_layers, source.render_uv);

    target.active_uv = position_named(&target.uv_layers, "Baking")
        .or_else(|| position_named(&target.uv_layers, "UVMap"))
        .or_else(|| follow_by_name(&target.uv_layers, &source.uv_layers, source.active_uv))
        .or_else(|| first_index(&target.uv_layers));

    target.active_color = position_named(&target.color_layers, "PREVIEW")
        .or_else(|| follow_by_name(&target.color_layers, &source.color_layers, source.active_color))
        .or_else(|| first_index(&target.color_layers));
}

/// Makes the first image texture whose image name contains "preview" the
/// active node of every material the slots use.
pub fn activate_preview_textures(materials: &mut BTreeMap<String, Material>, slots: &[MaterialSlot]) {
    for slot in slots {
        let material = match slot.material.as_ref().and_then(|name| materials.get_mut(name)) {
            Some(material) => material,
            None => continue,
        };

        let preview = material.nodes.iter().position(|node| match &node.kind {
            ShaderNodeKind::ImageTexture { image: Some(image) } => image.contains("preview"),
            _ => false,
        });

        if let Some(index) = preview {
            log::trace!("Activating preview texture {}", material.nodes[index].name);
            material.active_node = Some(index);
        }
    }
}

fn position_named<T>(layers: &[CornerLayer<T>], name: &str) -> Option<usize> {
    layers.iter().position(|layer| layer.name == name)
}

fn follow_by_name<T, U>(
    target: &[CornerLayer<T>],
    source: &[CornerLayer<U>],
    source_index: Option<usize>,
) -> Option<usize> {
    let name = &source.get(source_index?)?.name;
    position_named(target, name)
}

fn first_index<T>(layers: &[CornerLayer<T>]) -> Option<usize> {
    if layers.is_empty() {
        None
    } else {
        Some(0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use glam::{Vec2, Vec4};

    use crate::scene::ShaderNode;

    fn uv(name: &str) -> CornerLayer<Vec2> {
        CornerLayer::new(name, 4)
    }

    #[test]
    fn baking_beats_uvmap() {
        let mut mesh = Mesh {
            uv_layers: vec![uv("UVMap"), uv("Baking"), uv("Extra")],
            ..Default::default()
        };
        let source = mesh.clone();

        apply_active_layers(&mut mesh, &source);
        assert_eq!(mesh.active_uv, Some(1));

        mesh.uv_layers.remove(1);
        apply_active_layers(&mut mesh, &source);
        assert_eq!(mesh.active_uv, Some(0));
    }

    #[test]
    fn other_layers_follow_the_source() {
        let source = Mesh {
            uv_layers: vec![uv("A"), uv("B")],
            active_uv: Some(1),
            render_uv: Some(0),
            color_layers: vec![CornerLayer::<Vec4>::new("Dirt", 4)],
            active_color: Some(0),
            ..Default::default()
        };

        let mut target = Mesh {
            uv_layers: vec![uv("B"), uv("A")],
            color_layers: vec![
                CornerLayer::<Vec4>::new("Dirt", 4),
                CornerLayer::<Vec4>::new("PREVIEW", 4),
            ],
            ..Default::default()
        };

        apply_active_layers(&mut target, &source);

        assert_eq!(target.active_uv, Some(0));
        assert_eq!(target.render_uv, Some(1));
        assert_eq!(target.active_color, Some(1));
    }

    #[test]
    fn preview_texture_becomes_active() {
        let mut materials = BTreeMap::new();
        materials.insert(
            "Skin".to_owned(),
            Material::new()
                .with_node(ShaderNode {
                    name: "Albedo".to_owned(),
                    kind: ShaderNodeKind::ImageTexture {
                        image: Some("skin_albedo.png".to_owned()),
                    },
                })
                .with_node(ShaderNode {
                    name: "Preview".to_owned(),
                    kind: ShaderNodeKind::ImageTexture {
                        image: Some("skin_preview.png".to_owned()),
                    },
                }),
        );

        activate_preview_textures(&mut materials, &[MaterialSlot::new("Skin"), MaterialSlot::default()]);

        assert_eq!(materials["Skin"].active_node, Some(1));
    }
}

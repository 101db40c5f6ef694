
use std::collections::HashMap;

use maplit::hashmap;
use memofs::{InMemoryFs, Vfs, VfsSnapshot};

use crate::{
    fixtures::quad_strip,
    layer::BuildLayer,
    scene::{Leaf, LeafData, Mesh, Node, Scene},
    store::VersionedStore,
};

/// An in-memory store with every layer directory for `hero` and `ghost`.
///
/// Each `(asset, layer, count)` in `unreadable` fills that layer with
/// `count` files that aren't valid scenes. They still count as published
/// versions.
fn memory_store(unreadable: &[(&str, &str, u32)]) -> VersionedStore {
    let mut wip = HashMap::new();
    let mut build = HashMap::new();

    for asset in ["hero", "ghost"] {
        let layers: HashMap<String, VfsSnapshot> = BuildLayer::all()
            .iter()
            .map(|layer| {
                let files: HashMap<String, VfsSnapshot> = unreadable
                    .iter()
                    .filter(|(a, l, _)| *a == asset && *l == layer.storage_key)
                    .flat_map(|&(a, l, count)| {
                        (1..=count).map(move |number| {
                            (
                                format!("{}_{}_v{:03}.scene.json", a, l, number),
                                VfsSnapshot::file("{ not a scene"),
                            )
                        })
                    })
                    .collect();

                (layer.storage_key.to_owned(), VfsSnapshot::dir(files))
            })
            .collect();

        wip.insert(asset.to_owned(), VfsSnapshot::dir(layers));
        build.insert(asset.to_owned(), VfsSnapshot::empty_dir());
    }

    let mut imfs = InMemoryFs::new();
    imfs.load_snapshot(
        "/store",
        VfsSnapshot::dir(hashmap! {
            "wip" => VfsSnapshot::dir(wip),
            "build" => VfsSnapshot::dir(build),
        }),
    )
    .unwrap();

    VersionedStore::open(Vfs::new(imfs), "/store").unwrap()
}

/// What a modeller's file looks like before anything is tagged: a
/// container holding one mesh.
fn modelling_file(mesh: Mesh) -> Scene {
    let mut scene = Scene::new("modelling");
    let root = scene.tree.root_id();
    let hero = scene.tree.insert(root, Node::container("Hero"));
    scene
        .tree
        .insert(hero, Node::leaf("Body", Leaf::new(LeafData::Mesh(mesh))));
    scene
}

fn models() -> &'static BuildLayer {
    BuildLayer::find("models").unwrap()
}

fn default_file() -> Scene {
    modelling_file(quad_strip())
}

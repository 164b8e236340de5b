use burrow_voxels::{LibraryError, TransitionKind, VoxelLibrary};

const SMALL: &str = r#"
[atlas]
columns = 4
rows = 4

[[voxel]]
name = "dirt"
tile = [1, 0]
top = [2, 0]
can_ramp = true

[[grass]]
name = "lush"
tile = [0, 1]
fringe_precedence = 3
fringe_edge = [1, 1]
decays = true
becomes_when_decays = "dead"

[[grass]]
name = "dead"
tile = [0, 2]

[[decal]]
name = "paint"
tile = [3, 3]
"#;

#[test]
fn ids_follow_file_order() {
    let lib = VoxelLibrary::from_toml_str(SMALL).expect("library");
    assert_eq!(lib.voxel_id("empty"), Some(0));
    assert_eq!(lib.voxel_id("dirt"), Some(1));
    assert_eq!(lib.grass_id("lush"), Some(1));
    assert_eq!(lib.grass_id("dead"), Some(2));
    assert_eq!(lib.decal_id("paint"), Some(1));
    assert!(lib.grass_type(0).is_none());
    assert!(lib.decal_type(0).is_none());
    let lush = lib.grass_type(1).expect("lush");
    assert_eq!(lush.becomes_when_decays, Some(2));
    // a lone edge tile doubles as the corner tile
    let fringe = lush.fringe.expect("fringe");
    assert_eq!(fringe.edge, fringe.corner);
}

#[test]
fn primitives_use_face_overrides() {
    let lib = VoxelLibrary::from_toml_str(SMALL).expect("library");
    assert!(lib.voxel_primitive(0).is_none());
    let t = lib.voxel_primitive(1).expect("dirt template");
    assert_eq!(t.top.u0, 0.5);
    assert_eq!(t.side.u0, 0.25);
    assert_eq!(t.bottom, t.side);
    assert!(t.transitions.is_none());
    assert!(lib.voxel_primitive(9).is_none());
}

#[test]
fn unknown_decay_target_is_rejected() {
    let src = SMALL.replace("becomes_when_decays = \"dead\"", "becomes_when_decays = \"ghost\"");
    match VoxelLibrary::from_toml_str(&src) {
        Err(LibraryError::UnknownGrassType(from, to)) => {
            assert_eq!(from, "lush");
            assert_eq!(to, "ghost");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn tiles_outside_atlas_are_rejected() {
    let src = SMALL.replace("tile = [3, 3]", "tile = [4, 0]");
    assert!(matches!(
        VoxelLibrary::from_toml_str(&src),
        Err(LibraryError::TileOutOfAtlas { .. })
    ));
}

#[test]
fn too_many_grass_types() {
    let mut src = String::from("[atlas]\ncolumns = 4\nrows = 4\n");
    for i in 0..16 {
        src.push_str(&format!("[[grass]]\nname = \"g{i}\"\ntile = [0, 0]\n"));
    }
    assert!(matches!(
        VoxelLibrary::from_toml_str(&src),
        Err(LibraryError::TooMany { kind: "grass", count: 16, max: 15 })
    ));
}

#[test]
fn shipped_library_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/voxels/library.toml");
    let lib = VoxelLibrary::from_path(path).expect("shipped library");
    let sand = lib.voxel_id("sand").and_then(|id| lib.voxel_type(id)).expect("sand");
    assert_eq!(sand.transitions, TransitionKind::Horizontal);
    let template = lib.voxel_primitive(sand.id).expect("sand template");
    assert!(template.transitions.is_some());
    let marker = lib.voxel_id("marker").expect("marker");
    assert!(lib.voxel_primitive(marker).is_none());
    let grass = lib.grass_type(lib.grass_id("grass").expect("grass")).expect("grass type");
    assert_eq!(grass.motes.len(), 2);
}

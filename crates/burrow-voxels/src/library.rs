use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::atlas::{Atlas, AtlasTile, UvRect};
use crate::config::{LibraryConfig, TransitionDef, VoxelDef};
use crate::types::{
    BoxTemplate, DecalType, FringeTiles, GrassType, MoteDetail, TransitionKind, VoxelType,
    EMPTY_VOXEL,
};

const MAX_VOXEL_TYPES: usize = 255;
const MAX_GRASS_TYPES: usize = 15;
const MAX_DECAL_TYPES: usize = 31;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("failed to read voxel library: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid voxel library: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("too many {kind} types: {count} (max {max})")]
    TooMany {
        kind: &'static str,
        count: usize,
        max: usize,
    },
    #[error("duplicate {kind} type name `{name}`")]
    DuplicateName { kind: &'static str, name: String },
    #[error("grass type `{0}` decays into unknown grass type `{1}`")]
    UnknownGrassType(String, String),
    #[error("voxel type `{0}` uses transitions but has no `transition_start` tile")]
    MissingTransitionTiles(String),
    #[error("voxel type `{0}` has no tile for one of its faces")]
    MissingTile(String),
    #[error("tile ({x}, {y}) of `{owner}` lies outside the atlas")]
    TileOutOfAtlas { owner: String, x: u16, y: u16 },
}

/// Read-only catalog of voxel, grass and decal types keyed by their packed IDs.
///
/// Voxel ID 0 is the empty voxel. Grass and decal ID 0 mean "none"; defined types are
/// numbered from 1 in file order.
#[derive(Clone, Debug)]
pub struct VoxelLibrary {
    atlas: Atlas,
    fog_uv: UvRect,
    voxels: Vec<VoxelType>,
    primitives: Vec<Option<BoxTemplate>>,
    grass: Vec<GrassType>,
    decals: Vec<DecalType>,
    voxel_by_name: HashMap<String, u8>,
    grass_by_name: HashMap<String, u8>,
    decal_by_name: HashMap<String, u8>,
}

fn check_tile(atlas: &Atlas, owner: &str, tile: AtlasTile) -> Result<AtlasTile, LibraryError> {
    if atlas.contains(tile) {
        Ok(tile)
    } else {
        Err(LibraryError::TileOutOfAtlas {
            owner: owner.to_string(),
            x: tile.x,
            y: tile.y,
        })
    }
}

fn too_many(kind: &'static str, count: usize, max: usize) -> Result<(), LibraryError> {
    if count > max {
        Err(LibraryError::TooMany { kind, count, max })
    } else {
        Ok(())
    }
}

fn empty_voxel() -> VoxelType {
    VoxelType {
        id: EMPTY_VOXEL,
        name: "empty".to_string(),
        can_ramp: false,
        is_transparent: true,
        emits_light: false,
        grass_spreads_here: false,
        transitions: TransitionKind::None,
        tint: [255; 4],
        update_hook: None,
    }
}

fn compile_template(atlas: &Atlas, def: &VoxelDef) -> Result<Option<BoxTemplate>, LibraryError> {
    if def.invisible {
        return Ok(None);
    }
    let face = |t: Option<AtlasTile>| -> Result<UvRect, LibraryError> {
        let tile = t
            .or(def.tile)
            .ok_or_else(|| LibraryError::MissingTile(def.name.clone()))?;
        Ok(atlas.uv(check_tile(atlas, &def.name, tile)?))
    };
    let transitions = match def.transitions {
        TransitionDef::None => None,
        TransitionDef::Horizontal | TransitionDef::Vertical => {
            let start = def
                .transition_start
                .ok_or_else(|| LibraryError::MissingTransitionTiles(def.name.clone()))?;
            check_tile(atlas, &def.name, atlas.advance(start, 15))?;
            Some(core::array::from_fn(|i| atlas.uv(atlas.advance(start, i as u16))))
        }
    };
    Ok(Some(BoxTemplate {
        top: face(def.top)?,
        bottom: face(def.bottom)?,
        side: face(def.side)?,
        transitions,
    }))
}

impl VoxelLibrary {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, LibraryError> {
        let cfg: LibraryConfig = toml::from_str(toml_str)?;
        Self::from_config(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_config(cfg: LibraryConfig) -> Result<Self, LibraryError> {
        let atlas = Atlas {
            columns: cfg.atlas.columns.max(1),
            rows: cfg.atlas.rows.max(1),
        };
        let fog_uv = atlas.uv(check_tile(&atlas, "fog", cfg.atlas.fog)?);
        too_many("voxel", cfg.voxels.len(), MAX_VOXEL_TYPES)?;
        too_many("grass", cfg.grass.len(), MAX_GRASS_TYPES)?;
        too_many("decal", cfg.decals.len(), MAX_DECAL_TYPES)?;

        let mut voxels = vec![empty_voxel()];
        let mut primitives = vec![None];
        let mut voxel_by_name = HashMap::from([("empty".to_string(), EMPTY_VOXEL)]);
        for (i, def) in cfg.voxels.iter().enumerate() {
            let id = (i + 1) as u8;
            if voxel_by_name.insert(def.name.clone(), id).is_some() {
                return Err(LibraryError::DuplicateName {
                    kind: "voxel",
                    name: def.name.clone(),
                });
            }
            primitives.push(compile_template(&atlas, def)?);
            voxels.push(VoxelType {
                id,
                name: def.name.clone(),
                can_ramp: def.can_ramp,
                is_transparent: def.transparent,
                emits_light: def.emits_light,
                grass_spreads_here: def.grass_spreads_here,
                transitions: match def.transitions {
                    TransitionDef::None => TransitionKind::None,
                    TransitionDef::Horizontal => TransitionKind::Horizontal,
                    TransitionDef::Vertical => TransitionKind::Vertical,
                },
                tint: def.tint,
                update_hook: def.update_hook.clone(),
            });
        }

        let mut grass_by_name = HashMap::new();
        for (i, def) in cfg.grass.iter().enumerate() {
            if grass_by_name.insert(def.name.clone(), (i + 1) as u8).is_some() {
                return Err(LibraryError::DuplicateName {
                    kind: "grass",
                    name: def.name.clone(),
                });
            }
        }
        let mut grass = Vec::with_capacity(cfg.grass.len());
        for (i, def) in cfg.grass.into_iter().enumerate() {
            let becomes_when_decays = match &def.becomes_when_decays {
                Some(name) => Some(
                    *grass_by_name
                        .get(name)
                        .ok_or_else(|| LibraryError::UnknownGrassType(def.name.clone(), name.clone()))?,
                ),
                None => None,
            };
            let fringe = match (def.fringe_edge, def.fringe_corner) {
                (Some(edge), Some(corner)) => Some(FringeTiles {
                    edge: atlas.uv(check_tile(&atlas, &def.name, edge)?),
                    corner: atlas.uv(check_tile(&atlas, &def.name, corner)?),
                }),
                (Some(edge), None) => {
                    let uv = atlas.uv(check_tile(&atlas, &def.name, edge)?);
                    Some(FringeTiles { edge: uv, corner: uv })
                }
                _ => None,
            };
            grass.push(GrassType {
                id: (i + 1) as u8,
                uv: atlas.uv(check_tile(&atlas, &def.name, def.tile)?),
                fringe_precedence: def.fringe_precedence,
                fringe,
                spreads: def.spreads,
                needs_sunlight: def.needs_sunlight,
                decays: def.decays,
                initial_decay: def.initial_decay.min(15),
                becomes_when_decays,
                tint: def.tint,
                motes: def
                    .motes
                    .into_iter()
                    .map(|m| MoteDetail {
                        name: m.name,
                        spawn_threshold: m.spawn_threshold,
                        min_scale: m.min_scale,
                        max_scale: m.max_scale.max(m.min_scale),
                        frequency: m.frequency,
                    })
                    .collect(),
                name: def.name,
            });
        }

        let mut decals = Vec::with_capacity(cfg.decals.len());
        let mut decal_by_name = HashMap::new();
        for (i, def) in cfg.decals.into_iter().enumerate() {
            let id = (i + 1) as u8;
            if decal_by_name.insert(def.name.clone(), id).is_some() {
                return Err(LibraryError::DuplicateName {
                    kind: "decal",
                    name: def.name,
                });
            }
            let tile = check_tile(&atlas, &def.name, def.tile)?;
            decals.push(DecalType {
                id,
                tile,
                uv: atlas.uv(tile),
                tint: def.tint,
                name: def.name,
            });
        }

        log::debug!(
            "voxel library: {} voxel, {} grass, {} decal types",
            voxels.len() - 1,
            grass.len(),
            decals.len()
        );
        Ok(Self {
            atlas,
            fog_uv,
            voxels,
            primitives,
            grass,
            decals,
            voxel_by_name,
            grass_by_name,
            decal_by_name,
        })
    }

    #[inline]
    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    #[inline]
    pub fn fog_uv(&self) -> UvRect {
        self.fog_uv
    }

    #[inline]
    pub fn voxel_type(&self, id: u8) -> Option<&VoxelType> {
        self.voxels.get(usize::from(id))
    }

    /// Mesh template for a voxel type; `None` for empty, invisible or unknown types.
    #[inline]
    pub fn voxel_primitive(&self, id: u8) -> Option<&BoxTemplate> {
        self.primitives.get(usize::from(id)).and_then(Option::as_ref)
    }

    #[inline]
    pub fn grass_type(&self, id: u8) -> Option<&GrassType> {
        if id == 0 {
            return None;
        }
        self.grass.get(usize::from(id) - 1)
    }

    #[inline]
    pub fn decal_type(&self, id: u8) -> Option<&DecalType> {
        if id == 0 {
            return None;
        }
        self.decals.get(usize::from(id) - 1)
    }

    pub fn voxel_id(&self, name: &str) -> Option<u8> {
        self.voxel_by_name.get(name).copied()
    }

    pub fn grass_id(&self, name: &str) -> Option<u8> {
        self.grass_by_name.get(name).copied()
    }

    pub fn decal_id(&self, name: &str) -> Option<u8> {
        self.decal_by_name.get(name).copied()
    }

    pub fn voxel_types(&self) -> impl Iterator<Item = &VoxelType> {
        self.voxels.iter().skip(1)
    }

    pub fn grass_types(&self) -> impl Iterator<Item = &GrassType> {
        self.grass.iter()
    }
}

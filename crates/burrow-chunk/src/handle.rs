use std::sync::Arc;

use burrow_world::constants::CHUNK_SIZE_Y;
use burrow_world::{GlobalVoxelCoordinate, LocalVoxelCoordinate};

use crate::chunk::{VoxelChangeEvent, VoxelChangeKind, VoxelChunk};
use crate::packed;
use crate::ramp::RampType;
use crate::sample::VoxelSample;

/// A view of one voxel: the owning chunk plus a local coordinate.
#[derive(Clone)]
pub struct VoxelHandle {
    chunk: Arc<VoxelChunk>,
    local: LocalVoxelCoordinate,
}

impl VoxelHandle {
    pub fn new(chunk: Arc<VoxelChunk>, local: LocalVoxelCoordinate) -> Self {
        Self { chunk, local }
    }

    #[inline]
    pub fn chunk(&self) -> &Arc<VoxelChunk> {
        &self.chunk
    }

    #[inline]
    pub fn local(&self) -> LocalVoxelCoordinate {
        self.local
    }

    #[inline]
    pub fn coordinate(&self) -> GlobalVoxelCoordinate {
        GlobalVoxelCoordinate::from_chunk_local(self.chunk.id(), self.local)
    }

    #[inline]
    pub fn sample(&self) -> VoxelSample {
        self.chunk.data.sample(self.local)
    }

    #[inline]
    pub fn type_id(&self) -> u8 {
        self.chunk.data.type_at(self.local)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.type_id() == 0
    }

    fn invalidate_own_slice(&self) {
        self.chunk.invalidate_slice(usize::from(self.local.y));
    }

    /// Invalidates this slice and the ones above and below inside the chunk; the manager
    /// handles slices in neighbouring chunks from the change event.
    fn invalidate_neighbourhood(&self) {
        let y = usize::from(self.local.y);
        for s in y.saturating_sub(1)..=(y + 1).min(CHUNK_SIZE_Y - 1) {
            self.chunk.invalidate_slice(s);
        }
    }

    pub fn set_type(&self, t: u8) {
        let old = self.chunk.data.set_type(self.local, t);
        if old == t {
            return;
        }
        if t == 0 {
            // no grass or decal survives on air
            self.chunk.data.update_grass(self.local, |_| 0);
            self.chunk.data.update_decal(self.local, |_| 0);
        }
        self.invalidate_neighbourhood();
        self.chunk.notify_voxel_changed(VoxelChangeEvent {
            coordinate: self.coordinate(),
            kind: VoxelChangeKind::TypeChanged { old, new: t },
        });
    }

    #[inline]
    pub fn grass_type(&self) -> u8 {
        packed::grass_type(self.chunk.data.grass(self.local))
    }

    pub fn set_grass_type(&self, t: u8) {
        let old = self.chunk.data.update_grass(self.local, |b| packed::with_grass_type(b, t));
        if packed::grass_type(old) != t & 0xF {
            self.invalidate_own_slice();
        }
    }

    #[inline]
    pub fn grass_decay(&self) -> u8 {
        packed::grass_decay(self.chunk.data.grass(self.local))
    }

    /// Decay is simulation state with no visual; no rebuild is requested.
    pub fn set_grass_decay(&self, d: u8) {
        self.chunk.data.update_grass(self.local, |b| packed::with_grass_decay(b, d));
    }

    #[inline]
    pub fn decal_type(&self) -> u8 {
        packed::decal_type(self.chunk.data.decal(self.local))
    }

    pub fn set_decal_type(&self, t: u8) {
        let old = self.chunk.data.update_decal(self.local, |b| packed::with_decal_type(b, t));
        if packed::decal_type(old) != packed::decal_type(t) {
            self.invalidate_own_slice();
        }
    }

    #[inline]
    pub fn pathing_hint(&self) -> bool {
        packed::pathing_hint(self.chunk.data.decal(self.local))
    }

    pub fn set_pathing_hint(&self, on: bool) {
        self.chunk.data.update_decal(self.local, |b| packed::with_pathing_hint(b, on));
    }

    #[inline]
    pub fn ramp(&self) -> RampType {
        RampType::from_bits(packed::ramp(self.chunk.data.flags(self.local)))
    }

    /// Writes the cached ramp bits and returns whether they changed. Callers decide what
    /// to invalidate.
    pub fn set_ramp(&self, r: RampType) -> bool {
        let old = self.chunk.data.update_flags(self.local, |b| packed::with_ramp(b, r.bits()));
        packed::ramp(old) != r.bits()
    }

    #[inline]
    pub fn sunlight(&self) -> bool {
        packed::sunlight(self.chunk.data.flags(self.local))
    }

    pub fn set_sunlight(&self, on: bool) {
        let old = self.chunk.data.update_flags(self.local, |b| packed::with_sunlight(b, on));
        if packed::sunlight(old) != on {
            self.invalidate_neighbourhood();
        }
    }

    #[inline]
    pub fn explored(&self) -> bool {
        packed::explored(self.chunk.data.flags(self.local))
    }

    pub fn set_explored(&self, on: bool) {
        let old = self.chunk.data.update_flags(self.local, |b| packed::with_explored(b, on));
        if packed::explored(old) != on {
            self.invalidate_neighbourhood();
            if on {
                self.chunk.notify_voxel_changed(VoxelChangeEvent {
                    coordinate: self.coordinate(),
                    kind: VoxelChangeKind::Explored,
                });
            }
        }
    }

    #[inline]
    pub fn player_built(&self) -> bool {
        packed::player_built(self.chunk.data.flags(self.local))
    }

    pub fn set_player_built(&self, on: bool) {
        self.chunk.data.update_flags(self.local, |b| packed::with_player_built(b, on));
    }
}

impl core::fmt::Debug for VoxelHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VoxelHandle")
            .field("coordinate", &self.coordinate())
            .field("type_id", &self.type_id())
            .finish()
    }
}

use std::sync::Arc;

use burrow_chunk::VoxelChunk;

/// Chunks that currently hold a mesh, bounded by a soft cap.
///
/// Eviction walks the list from the least recently seen chunk and stops at the first one
/// that is visible, so a burst of visible chunks can keep the list above the cap.
#[derive(Debug, Default)]
pub struct LiveChunks {
    chunks: Vec<Arc<VoxelChunk>>,
}

impl LiveChunks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains(&self, chunk: &VoxelChunk) -> bool {
        self.chunks.iter().any(|c| c.id() == chunk.id())
    }

    pub fn touch(&mut self, chunk: &Arc<VoxelChunk>) {
        if !self.contains(chunk) {
            self.chunks.push(Arc::clone(chunk));
        }
    }

    pub fn remove(&mut self, chunk: &VoxelChunk) {
        self.chunks.retain(|c| c.id() != chunk.id());
    }

    /// Discards the meshes of the least recently visible chunks until at most `cap` remain.
    /// Returns the evicted chunks.
    pub fn evict(&mut self, cap: usize) -> Vec<Arc<VoxelChunk>> {
        if self.chunks.len() <= cap {
            return Vec::new();
        }
        self.chunks
            .sort_by_key(|c| c.render_cycle_when_last_visible());
        let mut n = 0;
        while self.chunks.len() - n > cap && !self.chunks[n].visible() {
            n += 1;
        }
        let evicted: Vec<_> = self.chunks.drain(..n).collect();
        for chunk in &evicted {
            chunk.discard_primitive();
        }
        if !evicted.is_empty() {
            log::debug!("evicted {} chunk meshes, {} live", evicted.len(), self.chunks.len());
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_world::GlobalChunkCoordinate;

    fn chunk(x: i32, cycle: u64, visible: bool) -> Arc<VoxelChunk> {
        let c = Arc::new(VoxelChunk::new(GlobalChunkCoordinate::new(x, 0, 0)));
        c.set_render_cycle_when_last_visible(cycle);
        c.set_visible(visible);
        c
    }

    #[test]
    fn evicts_oldest_invisible_first() {
        let mut live = LiveChunks::new();
        for (x, cycle) in [(0, 30), (1, 10), (2, 20), (3, 40)] {
            live.touch(&chunk(x, cycle, false));
        }
        let evicted = live.evict(2);
        let ids: Vec<_> = evicted.iter().map(|c| c.id().x).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(live.len(), 2);
    }

    #[test]
    fn visible_oldest_chunks_block_eviction() {
        let mut live = LiveChunks::new();
        live.touch(&chunk(0, 1, true));
        live.touch(&chunk(1, 2, true));
        for x in 2..6 {
            live.touch(&chunk(x, 10 + x as u64, false));
        }
        assert!(live.evict(2).is_empty());
        assert_eq!(live.len(), 6);
    }

    #[test]
    fn touch_is_idempotent() {
        let mut live = LiveChunks::new();
        let c = chunk(0, 0, false);
        live.touch(&c);
        live.touch(&c);
        assert_eq!(live.len(), 1);
        live.remove(&c);
        assert!(live.is_empty());
    }
}

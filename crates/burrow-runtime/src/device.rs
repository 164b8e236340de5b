use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use burrow_chunk::{GpuMesh, GraphicsDevice};
use burrow_geom::MeshBuild;

/// A graphics device that keeps no GPU state, for tools, tests and servers.
///
/// Uploads succeed until [`HeadlessDevice::dispose`] is called and are counted.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    disposed: AtomicBool,
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    uploads: AtomicU64,
    uploaded_quads: AtomicU64,
    draws: AtomicU64,
}

struct HeadlessMesh {
    counters: Arc<Counters>,
}

impl GpuMesh for HeadlessMesh {
    fn draw(&self) {
        self.counters.draws.fetch_add(1, Ordering::Relaxed);
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    pub fn uploads(&self) -> u64 {
        self.counters.uploads.load(Ordering::Relaxed)
    }

    pub fn uploaded_quads(&self) -> u64 {
        self.counters.uploaded_quads.load(Ordering::Relaxed)
    }

    pub fn draws(&self) -> u64 {
        self.counters.draws.load(Ordering::Relaxed)
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn upload(&self, mesh: &MeshBuild) -> Option<Box<dyn GpuMesh>> {
        if self.is_disposed() {
            return None;
        }
        self.counters.uploads.fetch_add(1, Ordering::Relaxed);
        self.counters
            .uploaded_quads
            .fetch_add(mesh.quad_count() as u64, Ordering::Relaxed);
        Some(Box::new(HeadlessMesh {
            counters: Arc::clone(&self.counters),
        }))
    }
}

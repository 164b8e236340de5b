use crate::Vec3;

/// One quad, corners listed around its perimeter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub corners: [Vec3; 4],
    pub normal: Vec3,
    pub uvs: [(f32, f32); 4],
    pub colors: [[u8; 4]; 4],
    pub tint: [u8; 4],
    /// Triangulate along the 1-3 diagonal instead of 0-2.
    pub flip: bool,
}

/// CPU-side vertex/index buffer. Every quad contributes 4 vertices and 6 indices.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub col: Vec<u8>,
    pub tint: Vec<u8>,
    pub idx: Vec<u32>,
}

impl MeshBuild {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.idx.len()
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.vertex_count() / 4
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    /// Approximate buffer footprint, used for live-memory accounting.
    pub fn byte_size(&self) -> usize {
        (self.pos.len() + self.norm.len() + self.uv.len()) * 4
            + self.col.len()
            + self.tint.len()
            + self.idx.len() * 4
    }

    /// Clears all arrays but retains capacity for reuse.
    pub fn clear_keep_capacity(&mut self) {
        self.pos.clear();
        self.norm.clear();
        self.uv.clear();
        self.col.clear();
        self.tint.clear();
        self.idx.clear();
    }

    pub fn reserve_quads(&mut self, n_quads: usize) {
        self.pos.reserve(n_quads * 4 * 3);
        self.norm.reserve(n_quads * 4 * 3);
        self.uv.reserve(n_quads * 4 * 2);
        self.col.reserve(n_quads * 4 * 4);
        self.tint.reserve(n_quads * 4 * 4);
        self.idx.reserve(n_quads * 6);
    }

    /// Appends a quad. Corners are reordered when their winding disagrees with the normal;
    /// the reorder keeps diagonal pairs intact so `flip` keeps its meaning.
    pub fn push_quad(&mut self, quad: &Quad) {
        let mut q = *quad;
        let e1 = q.corners[1] - q.corners[0];
        let e2 = q.corners[2] - q.corners[0];
        if e1.cross(e2).dot(q.normal) < 0.0 {
            q.corners.swap(1, 3);
            q.uvs.swap(1, 3);
            q.colors.swap(1, 3);
        }
        let base = self.vertex_count() as u32;
        let n = q.normal;
        for i in 0..4 {
            let p = q.corners[i];
            self.pos.extend_from_slice(&[p.x, p.y, p.z]);
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
            self.uv.extend_from_slice(&[q.uvs[i].0, q.uvs[i].1]);
            self.col.extend_from_slice(&q.colors[i]);
            self.tint.extend_from_slice(&q.tint);
        }
        if q.flip {
            self.idx
                .extend_from_slice(&[base, base + 1, base + 3, base + 1, base + 2, base + 3]);
        } else {
            self.idx
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    /// Concatenates `other`, rebasing its indices.
    pub fn append(&mut self, other: &MeshBuild) {
        let base = self.vertex_count() as u32;
        self.pos.extend_from_slice(&other.pos);
        self.norm.extend_from_slice(&other.norm);
        self.uv.extend_from_slice(&other.uv);
        self.col.extend_from_slice(&other.col);
        self.tint.extend_from_slice(&other.tint);
        self.idx.extend(other.idx.iter().map(|i| i + base));
    }

    /// Normal of each quad, in emission order.
    pub fn quad_normals(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.norm
            .chunks_exact(12)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
    }

    /// The six indices emitted for quad `quad`.
    pub fn quad_indices(&self, quad: usize) -> Option<&[u32]> {
        self.idx.get(quad * 6..quad * 6 + 6)
    }
}

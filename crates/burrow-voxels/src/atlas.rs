use serde::Deserialize;

/// A cell of the texture atlas, in tile units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "[u16; 2]")]
pub struct AtlasTile {
    pub x: u16,
    pub y: u16,
}

impl AtlasTile {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl From<[u16; 2]> for AtlasTile {
    fn from(v: [u16; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

/// Normalised texture rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl UvRect {
    /// Point inside the rectangle; `(0, 0)` is the `(u0, v0)` corner.
    #[inline]
    pub fn lerp(&self, fu: f32, fv: f32) -> (f32, f32) {
        (
            self.u0 + (self.u1 - self.u0) * fu,
            self.v0 + (self.v1 - self.v0) * fv,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Atlas {
    pub columns: u16,
    pub rows: u16,
}

impl Atlas {
    pub fn contains(&self, tile: AtlasTile) -> bool {
        tile.x < self.columns && tile.y < self.rows
    }

    pub fn uv(&self, tile: AtlasTile) -> UvRect {
        let (cw, rh) = (1.0 / f32::from(self.columns), 1.0 / f32::from(self.rows));
        UvRect {
            u0: f32::from(tile.x) * cw,
            v0: f32::from(tile.y) * rh,
            u1: f32::from(tile.x + 1) * cw,
            v1: f32::from(tile.y + 1) * rh,
        }
    }

    /// The `n`th tile after `start`, wrapping to the next row at the atlas edge.
    pub fn advance(&self, start: AtlasTile, n: u16) -> AtlasTile {
        let linear = u32::from(start.y) * u32::from(self.columns) + u32::from(start.x) + u32::from(n);
        AtlasTile::new(
            (linear % u32::from(self.columns)) as u16,
            (linear / u32::from(self.columns)) as u16,
        )
    }
}

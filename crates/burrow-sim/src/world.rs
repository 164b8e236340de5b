/// What the simulation needs to know about the world outside the voxel grid.
pub trait WorldContext: Sync {
    /// Biome of the column at `(x, z)`.
    fn biome_at(&self, x: i32, z: i32) -> u8;
    fn game_seconds(&self) -> f64;
}

/// A world with one biome everywhere and a fixed clock.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlatWorld {
    pub biome: u8,
    pub seconds: f64,
}

impl WorldContext for FlatWorld {
    fn biome_at(&self, _x: i32, _z: i32) -> u8 {
        self.biome
    }

    fn game_seconds(&self) -> f64 {
        self.seconds
    }
}

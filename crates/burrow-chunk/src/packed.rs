//! Pure get/set functions for the bit-packed voxel bytes.
//!
//! | byte      | bits 7..0                                                  |
//! |-----------|------------------------------------------------------------|
//! | grass     | `TTTT DDDD` type, decay                                    |
//! | decal     | `--HT TTTT` pathing hint, type                             |
//! | flags     | `PESR RRRR` player-built, explored, sunlight, ramp         |
//! | liquid    | `OTTT TTTT` ocean, type                                    |
//!
//! Setters mask the incoming value and never touch co-located bits.

pub const GRASS_TYPE_SHIFT: u8 = 4;
pub const GRASS_TYPE_MASK: u8 = 0xF0;
pub const GRASS_DECAY_MASK: u8 = 0x0F;

pub const DECAL_TYPE_MASK: u8 = 0x1F;
pub const PATHING_HINT_BIT: u8 = 0x20;

pub const RAMP_MASK: u8 = 0x1F;
pub const SUNLIGHT_BIT: u8 = 0x20;
pub const EXPLORED_BIT: u8 = 0x40;
pub const PLAYER_BUILT_BIT: u8 = 0x80;

pub const LIQUID_TYPE_MASK: u8 = 0x7F;
pub const OCEAN_BIT: u8 = 0x80;

#[inline]
const fn with_bit(b: u8, bit: u8, on: bool) -> u8 {
    if on { b | bit } else { b & !bit }
}

#[inline]
pub const fn grass_type(b: u8) -> u8 {
    (b & GRASS_TYPE_MASK) >> GRASS_TYPE_SHIFT
}

#[inline]
pub const fn with_grass_type(b: u8, t: u8) -> u8 {
    (b & !GRASS_TYPE_MASK) | ((t << GRASS_TYPE_SHIFT) & GRASS_TYPE_MASK)
}

#[inline]
pub const fn grass_decay(b: u8) -> u8 {
    b & GRASS_DECAY_MASK
}

#[inline]
pub const fn with_grass_decay(b: u8, d: u8) -> u8 {
    (b & !GRASS_DECAY_MASK) | (d & GRASS_DECAY_MASK)
}

#[inline]
pub const fn decal_type(b: u8) -> u8 {
    b & DECAL_TYPE_MASK
}

#[inline]
pub const fn with_decal_type(b: u8, t: u8) -> u8 {
    (b & !DECAL_TYPE_MASK) | (t & DECAL_TYPE_MASK)
}

#[inline]
pub const fn pathing_hint(b: u8) -> bool {
    b & PATHING_HINT_BIT != 0
}

#[inline]
pub const fn with_pathing_hint(b: u8, on: bool) -> u8 {
    with_bit(b, PATHING_HINT_BIT, on)
}

#[inline]
pub const fn ramp(b: u8) -> u8 {
    b & RAMP_MASK
}

#[inline]
pub const fn with_ramp(b: u8, r: u8) -> u8 {
    (b & !RAMP_MASK) | (r & RAMP_MASK)
}

#[inline]
pub const fn sunlight(b: u8) -> bool {
    b & SUNLIGHT_BIT != 0
}

#[inline]
pub const fn with_sunlight(b: u8, on: bool) -> u8 {
    with_bit(b, SUNLIGHT_BIT, on)
}

#[inline]
pub const fn explored(b: u8) -> bool {
    b & EXPLORED_BIT != 0
}

#[inline]
pub const fn with_explored(b: u8, on: bool) -> u8 {
    with_bit(b, EXPLORED_BIT, on)
}

#[inline]
pub const fn player_built(b: u8) -> bool {
    b & PLAYER_BUILT_BIT != 0
}

#[inline]
pub const fn with_player_built(b: u8, on: bool) -> u8 {
    with_bit(b, PLAYER_BUILT_BIT, on)
}

#[inline]
pub const fn liquid_type(b: u8) -> u8 {
    b & LIQUID_TYPE_MASK
}

#[inline]
pub const fn with_liquid_type(b: u8, t: u8) -> u8 {
    (b & !LIQUID_TYPE_MASK) | (t & LIQUID_TYPE_MASK)
}

#[inline]
pub const fn ocean(b: u8) -> bool {
    b & OCEAN_BIT != 0
}

#[inline]
pub const fn with_ocean(b: u8, on: bool) -> u8 {
    with_bit(b, OCEAN_BIT, on)
}

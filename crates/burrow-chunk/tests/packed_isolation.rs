//! Exhaustive bit-isolation checks over every byte value.

use burrow_chunk::packed::*;

#[test]
fn grass_type_and_decay_are_independent() {
    for b in 0..=255u8 {
        for t in 0..16u8 {
            let s = with_grass_type(b, t);
            assert_eq!(grass_type(s), t);
            assert_eq!(grass_decay(s), grass_decay(b));
        }
        for d in 0..16u8 {
            let s = with_grass_decay(b, d);
            assert_eq!(grass_decay(s), d);
            assert_eq!(grass_type(s), grass_type(b));
        }
    }
}

#[test]
fn decal_type_and_pathing_hint_are_independent() {
    for b in 0..=255u8 {
        for t in 0..32u8 {
            let s = with_decal_type(b, t);
            assert_eq!(decal_type(s), t);
            assert_eq!(pathing_hint(s), pathing_hint(b));
            assert_eq!(s & 0xC0, b & 0xC0);
        }
        for on in [false, true] {
            let s = with_pathing_hint(b, on);
            assert_eq!(pathing_hint(s), on);
            assert_eq!(decal_type(s), decal_type(b));
        }
    }
}

#[test]
fn ramp_never_touches_flag_bits() {
    for b in 0..=255u8 {
        for r in 0..=255u8 {
            let s = with_ramp(b, r);
            assert_eq!(ramp(s), r & RAMP_MASK);
            assert_eq!(sunlight(s), sunlight(b));
            assert_eq!(explored(s), explored(b));
            assert_eq!(player_built(s), player_built(b));
        }
    }
}

#[test]
fn each_flag_bit_is_isolated() {
    for b in 0..=255u8 {
        for on in [false, true] {
            let s = with_sunlight(b, on);
            assert_eq!(sunlight(s), on);
            assert_eq!(s & !SUNLIGHT_BIT, b & !SUNLIGHT_BIT);

            let s = with_explored(b, on);
            assert_eq!(explored(s), on);
            assert_eq!(s & !EXPLORED_BIT, b & !EXPLORED_BIT);

            let s = with_player_built(b, on);
            assert_eq!(player_built(s), on);
            assert_eq!(s & !PLAYER_BUILT_BIT, b & !PLAYER_BUILT_BIT);
        }
    }
}

#[test]
fn liquid_type_and_ocean_are_independent() {
    for b in 0..=255u8 {
        for t in 0..128u8 {
            let s = with_liquid_type(b, t);
            assert_eq!(liquid_type(s), t);
            assert_eq!(ocean(s), ocean(b));
        }
        for on in [false, true] {
            let s = with_ocean(b, on);
            assert_eq!(ocean(s), on);
            assert_eq!(liquid_type(s), liquid_type(b));
        }
    }
}

#[test]
fn setters_truncate_oversized_values() {
    assert_eq!(grass_type(with_grass_type(0, 0x1F)), 0xF);
    assert_eq!(grass_decay(with_grass_decay(0, 0x1F)), 0xF);
    assert_eq!(decal_type(with_decal_type(0, 0xFF)), 0x1F);
    assert_eq!(liquid_type(with_liquid_type(0, 0xFF)), 0x7F);
}

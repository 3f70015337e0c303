//! Blank-position symmetry tables.
//!
//! The 16 blank positions fall into four corner regions (groups) of four cells
//! each. Inside a region the blank walks a fixed cycle of four slots (lookups),
//! and one rotation carries each region's slot 0 onto cell 15.

use crate::board::PUZZLE_SIZE;

/// Number of slots tracked per group.
pub const NUM_SLOTS: usize = 4;

/// Group of each blank position. Group 3 is the mirror image of group 1.
pub const REFERENCE_GROUP: [u8; PUZZLE_SIZE] = [2, 2, 1, 1, 2, 2, 1, 1, 3, 3, 0, 0, 3, 3, 0, 0];

/// Slot of each blank position within its group.
pub const REFERENCE_LOOKUP: [u8; PUZZLE_SIZE] = [0, 1, 3, 0, 3, 2, 2, 1, 3, 2, 2, 3, 0, 1, 1, 0];

/// Rotation carrying group 1 slot 0 (cell 3) onto cell 15.
pub const ROTATE_90_POS: [usize; PUZZLE_SIZE] =
    [12, 8, 4, 0, 13, 9, 5, 1, 14, 10, 6, 2, 15, 11, 7, 3];

/// Rotation carrying group 2 slot 0 (cell 0) onto cell 15.
pub const ROTATE_180_POS: [usize; PUZZLE_SIZE] =
    [15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0];

/// Cell of each `(group, lookup)` pair.
pub const SLOT_POSITION: [[u8; NUM_SLOTS]; 4] = [
    [15, 14, 10, 11],
    [3, 7, 6, 2],
    [0, 1, 5, 4],
    [12, 13, 9, 8],
];

#[inline]
pub fn group(blank_pos: u8) -> u8 { REFERENCE_GROUP[blank_pos as usize] }

#[inline]
pub fn lookup(blank_pos: u8) -> u8 { REFERENCE_LOOKUP[blank_pos as usize] }

#[inline]
pub fn slot_position(group: u8, lookup: u8) -> u8 {
    SLOT_POSITION[group as usize][lookup as usize]
}

/// Groups whose diagonal mirror stays inside the same group.
#[inline]
pub fn has_mirror_key(group: u8) -> bool { group == 0 || group == 2 }

/// Slot index as seen from the diagonal mirror of a group 0 or 2 board.
#[inline]
pub fn mirror_lookup(lookup: u8) -> u8 {
    match lookup {
        1 => 3,
        3 => 1,
        l => l,
    }
}

/// Rotate `tiles` so the given canonical group's slot 0 lands on cell 15.
pub fn rotate(tiles: &[u8; PUZZLE_SIZE], group: u8) -> [u8; PUZZLE_SIZE] {
    let table = match group {
        1 => &ROTATE_90_POS,
        2 => &ROTATE_180_POS,
        _ => return *tiles,
    };
    let mut out = [0u8; PUZZLE_SIZE];
    for (i, &src) in table.iter().enumerate() {
        out[i] = tiles[src];
    }
    out
}

/// Slide the blank from slot `lookup` to slot `lookup + 1` of `group`.
///
/// Slot 3 is the end of the walk and leaves the tiles untouched.
pub fn shift_region(tiles: &mut [u8; PUZZLE_SIZE], group: u8, lookup: u8) {
    if lookup as usize >= NUM_SLOTS - 1 || group > 3 {
        return;
    }
    let from = slot_position(group, lookup) as usize;
    let to = slot_position(group, lookup + 1) as usize;
    tiles[from] = tiles[to];
    tiles[to] = 0;
}

/// Slide the blank from slot `lookup` back to slot 0 of `group`.
pub fn rewind_region(tiles: &mut [u8; PUZZLE_SIZE], group: u8, lookup: u8) {
    for l in (1..=lookup.min(3)).rev() {
        let from = slot_position(group, l) as usize;
        let to = slot_position(group, l - 1) as usize;
        tiles[from] = tiles[to];
        tiles[to] = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    #[test]
    fn slot_position_inverts_tables() {
        for pos in 0..16u8 {
            assert_eq!(slot_position(group(pos), lookup(pos)), pos);
        }
    }

    #[test]
    fn group_and_lookup_tables() {
        let groups: Vec<u8> = (0..16).map(group).collect();
        let lookups: Vec<u8> = (0..16).map(lookup).collect();
        assert_eq!(groups, vec![2, 2, 1, 1, 2, 2, 1, 1, 3, 3, 0, 0, 3, 3, 0, 0]);
        assert_eq!(lookups, vec![0, 1, 3, 0, 3, 2, 2, 1, 3, 2, 2, 3, 0, 1, 1, 0]);
    }

    #[test]
    fn consecutive_slots_are_adjacent() {
        for g in 0..4u8 {
            for l in 0..4u8 {
                let a = slot_position(g, l) as i32;
                let b = slot_position(g, (l + 1) % 4) as i32;
                let (dr, dc) = ((a / 4 - b / 4).abs(), (a % 4 - b % 4).abs());
                assert_eq!(dr + dc, 1, "group {g} slot {l}");
            }
        }
    }

    #[test]
    fn rotation_moves_slot_zero_to_last_cell() {
        for g in 0..3u8 {
            let mut tiles = [1u8; 16];
            tiles[slot_position(g, 0) as usize] = 0;
            assert_eq!(rotate(&tiles, g)[15], 0);
        }
    }

    #[test]
    fn mirror_maps_groups_and_lookups() {
        for pos in 0..16u8 {
            let mut tiles = Board::GOAL.tiles();
            tiles.swap(15, pos as usize);
            let b = Board::from_tiles(tiles).unwrap();
            let m = b.mirror().zero_pos();
            match group(pos) {
                0 | 2 => {
                    assert_eq!(group(m), group(pos));
                    assert_eq!(lookup(m), mirror_lookup(lookup(pos)));
                }
                1 => assert_eq!((group(m), lookup(m)), (3, lookup(pos))),
                _ => assert_eq!((group(m), lookup(m)), (1, lookup(pos))),
            }
        }
    }

    #[test]
    fn shift_then_rewind_restores() {
        for g in 0..3u8 {
            let mut tiles = Board::GOAL.tiles();
            tiles.swap(15, slot_position(g, 0) as usize);
            let start = tiles;
            for l in 0..3u8 {
                shift_region(&mut tiles, g, l);
                assert_eq!(tiles[slot_position(g, l + 1) as usize], 0);
            }
            shift_region(&mut tiles, g, 3);
            assert_eq!(tiles[slot_position(g, 3) as usize], 0);
            rewind_region(&mut tiles, g, 3);
            assert_eq!(tiles, start);
        }
    }
}

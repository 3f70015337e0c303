//! Compiled-in reference boards.
//!
//! Every entry is a hard position with a known optimal cost. Entries with the blank on
//! cell 5 or cell 10 also yield a variant with the blank slid onto cell 6, one move
//! closer to the goal.

use crate::board::{Board, Direction};
use crate::reference::{CacheRecord, CanonicalKey, ReferenceMap};

/// `(tiles, blank cell, optimal cost)`.
pub type SeedEntry = ([u8; 16], u8, u8);

pub const DEFAULT_BOARDS: [SeedEntry; 30] = [
    ([0, 15, 8, 3, 12, 11, 7, 4, 14, 10, 6, 5, 9, 13, 2, 1], 0, 70),
    ([6, 5, 9, 13, 2, 1, 10, 14, 3, 7, 0, 15, 4, 8, 12, 11], 10, 72),
    ([0, 12, 8, 4, 15, 11, 7, 3, 14, 10, 6, 2, 13, 9, 5, 1], 0, 72),
    ([6, 5, 14, 13, 2, 1, 10, 9, 8, 7, 0, 15, 4, 3, 12, 11], 10, 70),
    ([0, 5, 9, 13, 2, 1, 10, 14, 3, 7, 11, 15, 4, 8, 12, 6], 0, 72),
    ([0, 12, 7, 4, 15, 11, 8, 3, 10, 14, 6, 2, 13, 9, 5, 1], 0, 70),
    ([0, 15, 8, 7, 12, 11, 4, 3, 14, 13, 6, 5, 10, 9, 2, 1], 0, 72),
    ([1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15, 4, 8, 12, 0], 15, 72),
    ([0, 15, 8, 4, 12, 11, 7, 5, 14, 10, 6, 3, 13, 2, 9, 1], 0, 70),
    ([1, 10, 14, 13, 7, 6, 5, 9, 8, 2, 11, 15, 4, 3, 12, 0], 15, 72),
    ([0, 12, 8, 7, 15, 11, 4, 3, 14, 13, 6, 2, 10, 9, 5, 1], 0, 72),
    ([6, 5, 14, 13, 2, 1, 10, 9, 8, 7, 11, 12, 4, 3, 15, 0], 15, 70),
    ([0, 5, 9, 13, 2, 6, 10, 14, 3, 7, 1, 15, 4, 8, 12, 11], 0, 72),
    ([6, 5, 9, 13, 2, 1, 10, 14, 3, 7, 11, 12, 4, 8, 15, 0], 15, 70),
    ([0, 15, 8, 13, 12, 11, 9, 10, 14, 3, 6, 2, 4, 7, 5, 1], 0, 78),
    ([11, 15, 9, 13, 12, 0, 10, 14, 3, 7, 6, 2, 4, 8, 5, 1], 5, 78),
    ([0, 12, 5, 13, 15, 6, 10, 9, 2, 7, 11, 14, 4, 3, 8, 1], 0, 78),
    ([0, 12, 8, 13, 15, 11, 7, 9, 14, 10, 6, 2, 4, 3, 5, 1], 0, 78),
    ([0, 14, 15, 13, 8, 11, 10, 5, 12, 7, 6, 9, 4, 2, 3, 1], 0, 78),
    ([0, 15, 9, 13, 11, 12, 10, 14, 3, 7, 6, 2, 4, 8, 5, 1], 0, 80),
    ([0, 12, 9, 13, 15, 11, 10, 14, 8, 3, 6, 2, 4, 7, 5, 1], 0, 80),
    ([0, 12, 9, 13, 15, 11, 10, 14, 7, 8, 6, 2, 4, 3, 5, 1], 0, 80),
    ([0, 12, 9, 13, 15, 8, 10, 14, 11, 7, 6, 2, 4, 3, 5, 1], 0, 80),
    ([0, 12, 9, 13, 15, 11, 10, 14, 3, 7, 5, 6, 4, 8, 2, 1], 0, 80),
    ([0, 12, 9, 13, 15, 11, 10, 14, 7, 8, 5, 6, 4, 3, 2, 1], 0, 80),
    ([0, 12, 9, 13, 15, 11, 10, 14, 3, 7, 6, 2, 4, 8, 5, 1], 0, 80),
    ([0, 12, 9, 13, 15, 11, 14, 10, 3, 8, 6, 2, 4, 7, 5, 1], 0, 80),
    ([0, 12, 10, 13, 15, 11, 9, 14, 7, 3, 6, 2, 4, 8, 5, 1], 0, 80),
    ([0, 12, 14, 13, 15, 11, 9, 10, 8, 3, 6, 2, 4, 7, 5, 1], 0, 80),
    ([0, 12, 10, 13, 15, 11, 14, 9, 7, 8, 6, 2, 4, 3, 5, 1], 0, 80),
];

/// Blank cells that yield a variant, with the move that slides the blank onto cell 6.
const VARIANT_MOVES: [(u8, Direction); 2] = [(5, Direction::Right), (10, Direction::Up)];

/// Expand the seed table into boards with their starting cost.
pub fn seed_boards() -> Vec<(Board, u8)> {
    let mut out = Vec::with_capacity(DEFAULT_BOARDS.len() + 4);
    for &(tiles, blank, cost) in &DEFAULT_BOARDS {
        let board = match Board::from_tiles(tiles) {
            Ok(b) if b.zero_pos() == blank => b,
            _ => {
                log::error!("skipping malformed seed board {tiles:?}");
                continue;
            }
        };
        out.push((board, cost));
        let variant = VARIANT_MOVES
            .iter()
            .find(|(cell, _)| *cell == blank)
            .and_then(|&(_, dir)| board.shift(dir));
        if let Some(variant) = variant {
            out.push((variant, cost - 1));
        }
    }
    out
}

/// The default reference map. Seeds landing on the same key are merged.
pub fn default_map() -> ReferenceMap {
    let mut map = ReferenceMap::default();
    for (board, cost) in seed_boards() {
        let record = CacheRecord::provisional(board.zero_pos(), cost);
        map.entry(CanonicalKey::from_board(&board))
            .and_modify(|r| r.update_moves(&record))
            .or_insert(record);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::symmetry::lookup;

    #[test]
    fn seeds_are_valid_solvable_boards() {
        let seeds = seed_boards();
        assert_eq!(seeds.len(), DEFAULT_BOARDS.len() + 3);
        for (board, cost) in &seeds {
            assert!(board.is_solvable(), "{board:?}");
            assert!(*cost >= 69);
        }
    }

    #[test]
    fn variants_slide_the_blank_onto_cell_six() {
        let map = default_map();
        let mut found = 0;
        for &(tiles, blank, cost) in &DEFAULT_BOARDS {
            if blank != 5 && blank != 10 {
                continue;
            }
            let mut shifted = tiles;
            shifted[blank as usize] = shifted[6];
            shifted[6] = 0;
            let variant = Board::from_tiles(shifted).unwrap();
            assert_eq!(variant.zero_pos(), 6);
            let record = &map[&CanonicalKey::from_board(&variant)];
            assert_eq!(record.estimate(lookup(6)), cost - 1, "seed {tiles:?}");
            found += 1;
        }
        assert_eq!(found, 3);
        let derived: Vec<_> = seed_boards()
            .iter()
            .filter(|(b, _)| b.zero_pos() == 6)
            .map(|&(_, c)| c)
            .collect();
        assert_eq!(derived, vec![71, 69, 77]);
    }

    #[test]
    fn default_map_is_unverified() {
        let map = default_map();
        assert_eq!(map.len(), seed_boards().len());
        assert!(map.values().all(|r| r.status() == 0));
        let first = CanonicalKey::from_board(&Board::from_tiles(DEFAULT_BOARDS[0].0).unwrap());
        assert_eq!(map[&first].estimate(0), 70);
    }
}

use std::fmt;

use crate::board::{Board, Direction};
use crate::reference::key::CanonicalKey;
use crate::reference::symmetry::{lookup, shift_region, NUM_SLOTS};
use crate::solver::{EngineError, SearchEngine};

/// Status bit of each slot.
pub const STATUS_BIT: [u8; NUM_SLOTS] = [1, 2, 4, 8];
/// Status of a record whose four slots are all verified.
pub const STATUS_COMPLETED: u8 = 0x0f;
/// Number of leading moves kept per slot.
pub const NUM_PARTIAL_MOVES: usize = 8;

/// Per-slot costs, leading moves, and verification status of one canonical board.
///
/// Estimates only grow and status bits are never cleared. Until a slot's bit is set its
/// estimate is a lower bound; afterwards it is the optimal cost of that slot's board.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheRecord {
    estimates: [u8; NUM_SLOTS],
    partial_paths: [u16; NUM_SLOTS],
    status: u8,
}

impl CacheRecord {
    /// Unverified record seeded from one known cost.
    ///
    /// The slot holding the blank gets `cost`; each other slot gets `cost` minus its slot
    /// distance. These are placeholders until a sweep verifies them.
    ///
    /// ```
    /// use ai_15puzzle::reference::CacheRecord;
    /// let r = CacheRecord::provisional(0, 70);
    /// assert_eq!(r.estimates(), [70, 69, 68, 67]);
    /// assert!(!r.is_completed());
    /// ```
    pub fn provisional(blank_pos: u8, cost: u8) -> Self {
        let slot = lookup(blank_pos) as i32;
        let mut estimates = [0u8; NUM_SLOTS];
        for (i, e) in estimates.iter_mut().enumerate() {
            let d = (i as i32 - slot).unsigned_abs() as u8;
            *e = cost.saturating_sub(d);
        }
        Self { estimates, partial_paths: [0; NUM_SLOTS], status: 0 }
    }

    /// Record rebuilt from stored fields.
    pub fn from_parts(
        estimates: [u8; NUM_SLOTS],
        partial_paths: [u16; NUM_SLOTS],
        status: u8,
    ) -> Self {
        Self { estimates, partial_paths, status: status & STATUS_COMPLETED }
    }

    #[inline]
    pub fn estimate(&self, lookup: u8) -> u8 { self.estimates[lookup as usize] }

    #[inline]
    pub fn estimates(&self) -> [u8; NUM_SLOTS] { self.estimates }

    #[inline]
    pub fn partial_path(&self, lookup: u8) -> u16 { self.partial_paths[lookup as usize] }

    #[inline]
    pub fn partial_paths(&self) -> [u16; NUM_SLOTS] { self.partial_paths }

    #[inline]
    pub fn status(&self) -> u8 { self.status }

    #[inline]
    pub fn is_verified(&self, lookup: u8) -> bool {
        self.status & STATUS_BIT[lookup as usize] != 0
    }

    #[inline]
    pub fn is_completed(&self) -> bool { self.status == STATUS_COMPLETED }

    #[inline]
    pub fn has_initial_moves(&self, lookup: u8) -> bool {
        self.partial_paths[lookup as usize] != 0
    }

    /// Store a verified cost and solution for one slot.
    pub fn update_solution(&mut self, lookup: u8, cost: u8, solution: &[Direction], reflect: bool) {
        self.status |= STATUS_BIT[lookup as usize];
        self.estimates[lookup as usize] = cost;
        self.partial_paths[lookup as usize] = pack_path(solution, reflect);
    }

    /// Merge another record for the same key.
    ///
    /// Status bits are OR-ed. Per slot the higher cost wins together with its path; an
    /// empty path is filled from `other` regardless of cost.
    pub fn update_moves(&mut self, other: &CacheRecord) {
        self.status |= other.status;
        for i in 0..NUM_SLOTS {
            if self.estimates[i] < other.estimates[i] {
                self.estimates[i] = other.estimates[i];
                self.partial_paths[i] = other.partial_paths[i];
            } else if self.partial_paths[i] == 0 {
                self.partial_paths[i] = other.partial_paths[i];
            }
        }
    }

    /// Verify every unverified slot of `key`'s region with `engine`.
    ///
    /// Walks the blank from slot 0 through slot 3 of the normalized board, searching each
    /// unverified slot from its current estimate. Slots are marked as they finish, so an
    /// engine error leaves the earlier results in place.
    pub fn update_solutions<E>(
        &mut self,
        key: &CanonicalKey,
        engine: &mut E,
    ) -> Result<(), EngineError>
    where
        E: SearchEngine + ?Sized,
    {
        let group = key.group();
        let mut tiles = key.tiles();
        for slot in 0..NUM_SLOTS as u8 {
            if !self.is_verified(slot) {
                let board = Board::pack(&tiles);
                engine.find_optimal_path(&board, self.estimates[slot as usize])?;
                let cost = engine.moves();
                self.update_solution(slot, cost, engine.solution(), false);
                log::debug!("verified {key:?} slot {slot}: {cost} moves");
            }
            shift_region(&mut tiles, group, slot);
        }
        Ok(())
    }

    /// Leading moves stored for `lookup`, low bits first, optionally reflected.
    pub fn initial_moves(&self, lookup: u8, reflect: bool) -> [Direction; NUM_PARTIAL_MOVES] {
        unpack_path(self.partial_paths[lookup as usize], reflect)
    }
}

/// Pack up to the first 8 moves, first move in the lowest bit pair.
pub fn pack_path(solution: &[Direction], reflect: bool) -> u16 {
    let mut value = 0u16;
    for i in (0..NUM_PARTIAL_MOVES).rev() {
        value <<= 2;
        if let Some(&dir) = solution.get(i) {
            let dir = if reflect { dir.mirror() } else { dir };
            value |= dir.value() as u16;
        }
    }
    value
}

pub fn unpack_path(value: u16, reflect: bool) -> [Direction; NUM_PARTIAL_MOVES] {
    let mut out = [Direction::Right; NUM_PARTIAL_MOVES];
    let mut v = value;
    for d in out.iter_mut() {
        let dir = Direction::from_value((v & 0x03) as u8);
        *d = if reflect { dir.mirror() } else { dir };
        v >>= 2;
    }
    out
}

impl fmt::Debug for CacheRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRecord")
            .field("estimates", &self.estimates)
            .field("partial_paths", &format_args!("{:04x?}", self.partial_paths))
            .field("status", &format_args!("{:04b}", self.status))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Direction::*;
    use crate::solver::testing::StubEngine;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn provisional_extrapolates_by_slot_distance() {
        // Blank at cell 0 is group 2 slot 0.
        assert_eq!(CacheRecord::provisional(0, 70).estimates(), [70, 69, 68, 67]);
        // Cell 10 is group 0 slot 2.
        assert_eq!(CacheRecord::provisional(10, 72).estimates(), [70, 71, 72, 71]);
        // Cell 2 is group 1 slot 3.
        assert_eq!(CacheRecord::provisional(2, 2).estimates(), [0, 0, 1, 2]);
        assert_eq!(CacheRecord::provisional(0, 70).status(), 0);
    }

    #[test]
    fn path_packing_order_and_reflect() {
        let path = [Down, Left, Up, Right, Right, Down, Left, Up, Up];
        let packed = pack_path(&path, false);
        // First move in the low pair.
        assert_eq!(packed & 0x3, Down.value() as u16);
        assert_eq!(packed >> 14, Up.value() as u16);
        assert_eq!(unpack_path(packed, false), path[..8]);
        let reflected = pack_path(&path, true);
        let expected: Vec<Direction> = path[..8].iter().map(|d| d.mirror()).collect();
        assert_eq!(unpack_path(reflected, false).to_vec(), expected);
        assert_eq!(unpack_path(reflected, true), path[..8]);
    }

    #[test]
    fn random_paths_round_trip() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..300 {
            let mut path = [Right; NUM_PARTIAL_MOVES];
            for d in path.iter_mut() {
                *d = Direction::from_value(rng.gen_range(0..4));
            }
            for reflect in [false, true] {
                assert_eq!(unpack_path(pack_path(&path, reflect), reflect), path, "{path:?}");
            }
        }
    }

    #[test]
    fn short_solutions_pad_with_zero() {
        let packed = pack_path(&[Up, Left], false);
        assert_eq!(packed, 0b10_11);
        assert_eq!(pack_path(&[], false), 0);
    }

    #[test]
    fn update_moves_keeps_higher_costs() {
        let mut a = CacheRecord::from_parts([70, 69, 68, 67], [0, 5, 0, 0], 0b0001);
        let b = CacheRecord::from_parts([68, 71, 68, 66], [9, 7, 3, 4], 0b0100);
        a.update_moves(&b);
        assert_eq!(a.estimates(), [70, 71, 68, 67]);
        assert_eq!(a.partial_paths(), [9, 7, 3, 4]);
        assert_eq!(a.status(), 0b0101);
        for i in 0..4 {
            assert!(a.estimate(i) >= b.estimate(i));
        }
    }

    #[test]
    fn update_solution_sets_only_its_bit() {
        let mut r = CacheRecord::provisional(5, 60);
        r.update_solution(2, 61, &[Left, Up], false);
        assert!(r.is_verified(2));
        assert!(!r.is_verified(0));
        assert_eq!(r.estimate(2), 61);
        assert!(r.has_initial_moves(2));
        assert!(!r.has_initial_moves(1));
    }

    #[test]
    fn sweep_completes_record_in_slot_order() {
        let tiles = [0, 15, 8, 3, 12, 11, 7, 4, 14, 10, 6, 5, 9, 13, 2, 1];
        let board = Board::from_tiles(tiles).unwrap();
        let key = CanonicalKey::from_board(&board);
        let mut record = CacheRecord::provisional(board.zero_pos(), 70);
        let mut engine = StubEngine::core().with_costs(&[70, 71, 72, 73]);
        record.update_solutions(&key, &mut engine).unwrap();
        assert!(record.is_completed());
        assert_eq!(record.estimates(), [70, 71, 72, 73]);
        let blanks: Vec<u8> = engine.calls.iter().map(|(b, _)| b.zero_pos()).collect();
        assert_eq!(blanks, vec![0, 1, 5, 4]);
        let bounds: Vec<u8> = engine.calls.iter().map(|&(_, lb)| lb).collect();
        assert_eq!(bounds, vec![70, 69, 68, 67]);
        for l in 0..4 {
            assert_eq!(record.initial_moves(l, false)[..4], [Left, Up, Right, Down]);
        }
    }

    #[test]
    fn sweep_skips_verified_slots_and_stops_on_error() {
        let board = Board::GOAL;
        let key = CanonicalKey::from_board(&board);
        let mut record = CacheRecord::provisional(15, 30);
        record.update_solution(1, 31, &[Up], false);
        let mut engine = StubEngine::core();
        engine.fail_on_call = Some(1);
        assert!(record.update_solutions(&key, &mut engine).is_err());
        assert_eq!(engine.calls.len(), 2);
        assert_eq!(engine.calls[1].0.zero_pos(), 10);
        assert_eq!(record.status(), 0b0011);
        assert!(!record.is_completed());
    }
}

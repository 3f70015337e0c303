use std::fmt;
use std::hash::{Hash, Hasher};

use crate::board::{Board, PUZZLE_SIZE};
use crate::reference::symmetry::{self, lookup, rewind_region, rotate, slot_position};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("transform key {0:#018x} is not a permutation")]
    NotPermutation(u64),
    #[error("invalid canonical group {0}")]
    InvalidGroup(u8),
    #[error("stored hashes do not describe the transform key {0:#018x}")]
    Inconsistent(u64),
}

/// Canonical identity of a board up to rotation, diagonal mirror, and blank walk.
///
/// The key is built from the *normalized* board: group 3 boards are mirrored onto
/// group 1, and the blank is walked back to slot 0 of its group. Every board whose
/// blank sits anywhere in the same region of the same layout shares one key; the
/// record slot is selected separately with [`symmetry::lookup`].
///
/// Equality and hashing use only `transform_key` and `group`. The hash words carry
/// the normalized tiles so the sweep start can be rebuilt after a reload.
#[derive(Clone, Copy)]
pub struct CanonicalKey {
    transform_key: u64,
    group: u8,
    hash1: i32,
    hash2: i32,
    hashcode: i32,
}

impl CanonicalKey {
    /// Canonical key of `board`.
    ///
    /// ```
    /// use ai_15puzzle::board::Board;
    /// use ai_15puzzle::reference::CanonicalKey;
    /// let key = CanonicalKey::from_board(&Board::GOAL);
    /// assert_eq!(key.group(), 0);
    /// assert_eq!(key.transform_key(), 0x0123_4567_89ab_cdef);
    /// ```
    pub fn from_board(board: &Board) -> Self {
        let blank = board.zero_pos();
        let mut group = symmetry::group(blank);
        let mut tiles = board.tiles();
        if group == 3 {
            group = 1;
            tiles = board.mirror().tiles();
        }
        rewind_region(&mut tiles, group, lookup(blank));
        Self::from_normalized(tiles, group)
    }

    /// Key of the diagonal mirror of `board`, for groups that map onto themselves.
    pub fn mirror_of(board: &Board) -> Option<Self> {
        if symmetry::has_mirror_key(symmetry::group(board.zero_pos())) {
            Some(Self::from_board(&board.mirror()))
        } else {
            None
        }
    }

    fn from_normalized(tiles: [u8; PUZZLE_SIZE], group: u8) -> Self {
        let rotated = rotate(&tiles, group);
        let mut transform = [0u8; PUZZLE_SIZE];
        for i in 1..PUZZLE_SIZE {
            transform[rotated[i - 1] as usize] = i as u8;
        }
        let transform_key = transform.iter().fold(0u64, |acc, &t| (acc << 4) | t as u64);
        let (hash1, hash2) = pack_hashes(&tiles);
        Self {
            transform_key,
            group,
            hash1,
            hash2,
            hashcode: hash1.wrapping_mul(hash2.wrapping_add(0x1111)),
        }
    }

    /// Rebuild a key from its stored fields, checking that they agree with each other.
    pub fn from_parts(
        transform_key: u64,
        group: u8,
        hash1: i32,
        hash2: i32,
        hashcode: i32,
    ) -> Result<Self, KeyError> {
        if group > 2 {
            return Err(KeyError::InvalidGroup(group));
        }
        if !is_permutation(transform_key) {
            return Err(KeyError::NotPermutation(transform_key));
        }
        let tiles = unpack_hashes(hash1, hash2);
        let normalized =
            Board::from_tiles(tiles).map_err(|_| KeyError::Inconsistent(transform_key))?;
        if normalized.zero_pos() != slot_position(group, 0) {
            return Err(KeyError::Inconsistent(transform_key));
        }
        let rebuilt = Self::from_normalized(tiles, group);
        if rebuilt.transform_key != transform_key {
            return Err(KeyError::Inconsistent(transform_key));
        }
        Ok(Self { transform_key, group, hash1, hash2, hashcode })
    }

    #[inline]
    pub fn transform_key(&self) -> u64 { self.transform_key }

    #[inline]
    pub fn group(&self) -> u8 { self.group }

    #[inline]
    pub fn hash1(&self) -> i32 { self.hash1 }

    #[inline]
    pub fn hash2(&self) -> i32 { self.hash2 }

    #[inline]
    pub fn hashcode(&self) -> i32 { self.hashcode }

    /// Normalized tiles: the canonical layout with the blank on slot 0 of `group`.
    pub fn tiles(&self) -> [u8; PUZZLE_SIZE] {
        unpack_hashes(self.hash1, self.hash2)
    }

    /// Normalized board, the starting point of a verification sweep.
    pub fn board(&self) -> Board {
        Board::pack(&self.tiles())
    }

    /// Position of each tile value in the rotated canonical board, indexed by value.
    pub fn transform_table(&self) -> [u8; PUZZLE_SIZE] {
        let mut out = [0u8; PUZZLE_SIZE];
        for (i, t) in out.iter_mut().enumerate() {
            *t = ((self.transform_key >> (60 - 4 * i)) & 0x0f) as u8;
        }
        out
    }

    /// Relabel `tiles` so this key's normalized board plays the role of the goal,
    /// then rotate the result by the key's group.
    pub fn transform(&self, tiles: &[u8; PUZZLE_SIZE]) -> [u8; PUZZLE_SIZE] {
        let table = self.transform_table();
        let mut relabelled = [0u8; PUZZLE_SIZE];
        for (pos, &t) in tiles.iter().enumerate() {
            relabelled[pos] = table[t as usize & 0x0f];
        }
        rotate(&relabelled, self.group)
    }
}

fn pack_hashes(tiles: &[u8; PUZZLE_SIZE]) -> (i32, i32) {
    let half = PUZZLE_SIZE / 2;
    let h1 = tiles[..half].iter().fold(0u32, |acc, &t| (acc << 4) | t as u32);
    let h2 = tiles[half..].iter().fold(0u32, |acc, &t| (acc << 4) | t as u32);
    (h1 as i32, h2 as i32)
}

fn unpack_hashes(hash1: i32, hash2: i32) -> [u8; PUZZLE_SIZE] {
    let raw = ((hash1 as u32 as u64) << 32) | hash2 as u32 as u64;
    Board::from_raw(raw).tiles()
}

fn is_permutation(key: u64) -> bool {
    let mut seen = 0u16;
    for i in 0..PUZZLE_SIZE {
        seen |= 1 << ((key >> (4 * i)) & 0x0f);
    }
    seen == u16::MAX
}

impl PartialEq for CanonicalKey {
    fn eq(&self, other: &Self) -> bool {
        self.transform_key == other.transform_key && self.group == other.group
    }
}

impl Eq for CanonicalKey {}

impl Hash for CanonicalKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.transform_key.hash(state);
        self.group.hash(state);
    }
}

impl fmt::Debug for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalKey({:#018x}, group {})", self.transform_key, self.group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Direction;
    use crate::reference::symmetry::shift_region;
    use rand::{rngs::StdRng, SeedableRng};

    fn board(tiles: [u8; 16]) -> Board {
        Board::from_tiles(tiles).unwrap()
    }

    #[test]
    fn whole_region_shares_one_key() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..32 {
            let b = Board::scrambled(&mut rng, 50);
            let key = CanonicalKey::from_board(&b);
            let mut tiles = key.tiles();
            for l in 0..3u8 {
                shift_region(&mut tiles, key.group(), l);
                assert_eq!(CanonicalKey::from_board(&board(tiles)), key);
            }
        }
    }

    #[test]
    fn group_three_folds_onto_group_one() {
        // Blank at cell 12, group 3.
        let b = board([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 0, 13, 14, 15]);
        let key = CanonicalKey::from_board(&b);
        assert_eq!(key.group(), 1);
        assert_eq!(key, CanonicalKey::from_board(&b.mirror()));
    }

    #[test]
    fn normalized_board_has_blank_on_slot_zero() {
        let b = board([6, 5, 9, 13, 2, 1, 10, 14, 3, 7, 0, 15, 4, 8, 12, 11]);
        let key = CanonicalKey::from_board(&b);
        assert_eq!(key.group(), 0);
        let n = key.board();
        assert_eq!(n.zero_pos(), 15);
        // Blank at cell 10 is slot 2: walked back through 14 to 15.
        assert_eq!(n.tiles(), [6, 5, 9, 13, 2, 1, 10, 14, 3, 7, 12, 15, 4, 8, 11, 0]);
    }

    #[test]
    fn goal_transforms_to_identity() {
        let key = CanonicalKey::from_board(&Board::GOAL);
        assert_eq!(key.hash1(), 0x1234_5678);
        assert_eq!(key.hash2(), 0x9abc_def0_u32 as i32);
        assert_eq!(key.transform(&Board::GOAL.tiles()), Board::GOAL.tiles());
    }

    #[test]
    fn transform_maps_key_board_to_goal() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..16 {
            let key = CanonicalKey::from_board(&Board::scrambled(&mut rng, 70));
            let rotated_normal = rotate(&key.tiles(), key.group());
            // The rotated normalized board relabelled by the table is the goal.
            let table = key.transform_table();
            let relabelled: Vec<u8> = rotated_normal.iter().map(|&t| table[t as usize]).collect();
            assert_eq!(relabelled, Board::GOAL.tiles().to_vec());
        }
    }

    #[test]
    fn mirror_key_only_for_self_mirroring_groups() {
        assert!(CanonicalKey::mirror_of(&Board::GOAL).is_some());
        let b = Board::GOAL.apply(&[Direction::Left, Direction::Left, Direction::Left]).unwrap();
        assert_eq!(b.zero_pos(), 12);
        assert!(CanonicalKey::mirror_of(&b).is_none());
    }

    #[test]
    fn from_parts_accepts_own_fields() {
        let mut rng = StdRng::seed_from_u64(1);
        let key = CanonicalKey::from_board(&Board::scrambled(&mut rng, 40));
        let (h1, h2, hc) = (key.hash1(), key.hash2(), key.hashcode());
        let back = CanonicalKey::from_parts(key.transform_key(), key.group(), h1, h2, hc).unwrap();
        assert_eq!(back, key);
        assert_eq!(back.tiles(), key.tiles());
    }

    #[test]
    fn from_parts_rejects_corruption() {
        let key = CanonicalKey::from_board(&Board::GOAL);
        let (tk, h1, h2, hc) = (key.transform_key(), key.hash1(), key.hash2(), key.hashcode());
        let dup = (tk & !0x0f) | 0x0e;
        assert_eq!(
            CanonicalKey::from_parts(dup, 0, h1, h2, hc),
            Err(KeyError::NotPermutation(dup))
        );
        assert_eq!(CanonicalKey::from_parts(tk, 3, h1, h2, hc), Err(KeyError::InvalidGroup(3)));
        assert_eq!(CanonicalKey::from_parts(tk, 2, h1, h2, hc), Err(KeyError::Inconsistent(tk)));
    }
}

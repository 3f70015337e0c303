use rand::Rng;
use std::fmt;

/// A direction the blank slides in.
///
/// Discriminants match the 2-bit encoding used by packed partial paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Right = 0,
    Down = 1,
    Left = 2,
    Up = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::Right, Direction::Down, Direction::Left, Direction::Up];

    /// 2-bit encoding of this direction.
    #[inline]
    pub fn value(self) -> u8 { self as u8 }

    /// Decode the low 2 bits of `value`.
    #[inline]
    pub fn from_value(value: u8) -> Self { Self::ALL[(value & 0x03) as usize] }

    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Up => Direction::Down,
        }
    }

    /// The direction seen through the main-diagonal reflection used by [`Board::mirror`].
    #[inline]
    pub fn mirror(self) -> Self {
        match self {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Left,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BoardError {
    #[error("tile value {0} out of range 0..16")]
    TileOutOfRange(u8),
    #[error("tile value {0} appears more than once")]
    DuplicateTile(u8),
}

pub const PUZZLE_SIZE: usize = 16;

type BoardRaw = u64;

/// Cell index of each cell after reflecting across the main diagonal.
const MIRROR_POS: [usize; PUZZLE_SIZE] = [0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15];
/// Tile value whose goal cell is the reflection of the goal cell of each tile value.
const MIRROR_VAL: [u8; PUZZLE_SIZE] = [0, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15, 4, 8, 12];

/// Packed 4x4 sliding-tile board as 16 4-bit nibbles in a `u64`.
///
/// Cell 0 (top-left) lives in the most significant nibble; tile value 0 is the blank.
/// Construction through [`Board::from_tiles`] guarantees each value 0..16 appears once.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board(BoardRaw);

impl Board {
    /// The solved arrangement: tiles 1..=15 in row-major order with the blank last.
    pub const GOAL: Board = Board(0x1234_5678_9abc_def0);

    /// Build a board from a row-major tile array.
    ///
    /// Rejects anything that is not a permutation of 0..16.
    ///
    /// ```
    /// use ai_15puzzle::board::Board;
    /// let b = Board::from_tiles([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 0]).unwrap();
    /// assert_eq!(b, Board::GOAL);
    /// assert_eq!(b.zero_pos(), 15);
    /// ```
    pub fn from_tiles(tiles: [u8; PUZZLE_SIZE]) -> Result<Self, BoardError> {
        let mut seen = 0u16;
        for &t in &tiles {
            if t as usize >= PUZZLE_SIZE { return Err(BoardError::TileOutOfRange(t)); }
            if seen & (1 << t) != 0 { return Err(BoardError::DuplicateTile(t)); }
            seen |= 1 << t;
        }
        Ok(Self::pack(&tiles))
    }

    /// Construct a `Board` from its raw packed representation without validation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self { Board(raw) }

    /// Borrow the raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw { self.0 }

    pub(crate) fn pack(tiles: &[u8; PUZZLE_SIZE]) -> Self {
        Board(tiles.iter().fold(0u64, |acc, &t| (acc << 4) | (t & 0x0f) as u64))
    }

    /// Tile value at row-major cell `idx`.
    #[inline]
    pub fn tile(&self, idx: usize) -> u8 {
        ((self.0 >> (60 - 4 * idx)) & 0x0f) as u8
    }

    pub fn tiles(&self) -> [u8; PUZZLE_SIZE] {
        let mut out = [0u8; PUZZLE_SIZE];
        for (i, t) in out.iter_mut().enumerate() {
            *t = self.tile(i);
        }
        out
    }

    /// Cell index of the blank.
    pub fn zero_pos(&self) -> u8 {
        (0..PUZZLE_SIZE).find(|&i| self.tile(i) == 0).unwrap_or(PUZZLE_SIZE - 1) as u8
    }

    /// Reflect the board across its main diagonal, relabelling tiles so the goal maps to itself.
    ///
    /// ```
    /// use ai_15puzzle::board::Board;
    /// assert_eq!(Board::GOAL.mirror(), Board::GOAL);
    /// ```
    pub fn mirror(&self) -> Self {
        let tiles = self.tiles();
        let mut out = [0u8; PUZZLE_SIZE];
        for i in 0..PUZZLE_SIZE {
            out[MIRROR_POS[i]] = MIRROR_VAL[tiles[i] as usize];
        }
        Self::pack(&out)
    }

    /// Slide the blank one cell in `dir`, or `None` when it would leave the grid.
    pub fn shift(&self, dir: Direction) -> Option<Self> {
        let zero = self.zero_pos() as usize;
        let (row, col) = (zero / 4, zero % 4);
        let target = match dir {
            Direction::Right if col < 3 => zero + 1,
            Direction::Left if col > 0 => zero - 1,
            Direction::Down if row < 3 => zero + 4,
            Direction::Up if row > 0 => zero - 4,
            _ => return None,
        };
        let mut tiles = self.tiles();
        tiles.swap(zero, target);
        Some(Self::pack(&tiles))
    }

    /// Apply a sequence of blank moves, stopping at the first illegal one.
    pub fn apply(&self, moves: &[Direction]) -> Option<Self> {
        moves.iter().try_fold(*self, |b, &d| b.shift(d))
    }

    /// Whether the goal is reachable, by the usual inversion-parity rule for even widths.
    pub fn is_solvable(&self) -> bool {
        let tiles = self.tiles();
        let mut inversions = 0u32;
        for i in 0..PUZZLE_SIZE {
            if tiles[i] == 0 { continue; }
            for j in (i + 1)..PUZZLE_SIZE {
                if tiles[j] != 0 && tiles[j] < tiles[i] { inversions += 1; }
            }
        }
        let blank_row_from_bottom = 4 - (self.zero_pos() as u32 / 4);
        (inversions % 2 == 0) == (blank_row_from_bottom % 2 == 1)
    }

    /// Scramble the goal with `steps` random blank moves, never undoing the previous move.
    ///
    /// ```
    /// use ai_15puzzle::board::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let b = Board::scrambled(&mut rng, 40);
    /// assert!(b.is_solvable());
    /// ```
    pub fn scrambled<R: Rng + ?Sized>(rng: &mut R, steps: usize) -> Self {
        let mut board = Board::GOAL;
        let mut last: Option<Direction> = None;
        let mut done = 0;
        while done < steps {
            let dir = Direction::ALL[rng.gen_range(0..4)];
            if last == Some(dir.opposite()) { continue; }
            if let Some(next) = board.shift(dir) {
                board = next;
                last = Some(dir);
                done += 1;
            }
        }
        board
    }
}

impl Default for Board {
    fn default() -> Self { Board::GOAL }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..4 {
            let cells: Vec<String> = (0..4)
                .map(|col| match self.tile(row * 4 + col) {
                    0 => "  ".to_string(),
                    t => format!("{t:>2}"),
                })
                .collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}

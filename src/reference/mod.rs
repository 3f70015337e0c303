//! Symmetry-aware reference-board cache.
//!
//! Slow optimal searches are remembered per equivalence class of boards. A class is
//! every board reachable by rotating the grid, reflecting it across the main diagonal,
//! or walking the blank around its 2x2 corner region; one [`CacheRecord`] holds the
//! costs and leading moves of all four blank positions of a region.
//!
//! Quick start:
//! ```
//! use ai_15puzzle::board::Board;
//! use ai_15puzzle::config::CacheConfig;
//! use ai_15puzzle::reference::ReferenceAccumulator;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let acc = ReferenceAccumulator::open(&CacheConfig::with_path(dir.path().join("reference.db")));
//! let hard = Board::from_tiles([0, 15, 8, 3, 12, 11, 7, 4, 14, 10, 6, 5, 9, 13, 2, 1]).unwrap();
//! assert_eq!(acc.lookup(&hard, false).unwrap().estimate, 70);
//! ```

mod accumulator;
mod key;
mod record;
pub mod seeds;
pub mod symmetry;

use std::collections::HashMap;

use ahash::RandomState as AHasher;

pub use accumulator::{CacheStatus, ReferenceAccumulator, ReferenceHit};
pub use key::{CanonicalKey, KeyError};
pub use record::{
    pack_path, unpack_path, CacheRecord, NUM_PARTIAL_MOVES, STATUS_BIT, STATUS_COMPLETED,
};
pub use symmetry::NUM_SLOTS;

/// Canonical key to record.
pub type ReferenceMap = HashMap<CanonicalKey, CacheRecord, AHasher>;

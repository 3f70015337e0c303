//! ai-15puzzle: the reference-board cache of an optimal 15-puzzle solver
//!
//! This crate provides:
//! - A compact `Board` type (16 nibbles in a `u64`) with blank moves and diagonal mirroring
//! - The `SearchEngine` seam an external optimal solver implements
//! - A persistent, symmetry-aware cache of hard boards (`reference` module)
//! - The fixed-width archive format behind it (`serialization` module)
//!
//! Quick start:
//! ```
//! use ai_15puzzle::board::{Board, Direction};
//! use ai_15puzzle::reference::CanonicalKey;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic scramble with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let b = Board::scrambled(&mut rng, 30);
//! assert!(b.is_solvable());
//!
//! // Blank on the bottom-left region: the board shares its key with its diagonal mirror
//! let corner = Board::GOAL.apply(&[Direction::Left, Direction::Left, Direction::Left]).unwrap();
//! assert_eq!(CanonicalKey::from_board(&corner), CanonicalKey::from_board(&corner.mirror()));
//! ```
//!
pub mod board;
pub mod config;
pub mod reference;
pub mod serialization;
pub mod solver;

//! The search-engine seam.
//!
//! The reference cache never searches on its own: every verified cost comes from an
//! implementation of [`SearchEngine`]. Only engines that pass [`validate_engine`] may
//! mutate the cache, and every bulk operation drives the engine through an
//! [`EngineToggleGuard`] so its caller-visible switches survive the call unchanged.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::board::{Board, Direction};

/// Concrete engine family, used to decide whether an engine may write to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Iterative-deepening search without cache assistance.
    Plain,
    /// Cache-assisted search over an additive heuristic.
    Smart,
    /// Cache-assisted search over a pattern database.
    SmartPdb,
}

/// Heuristic function configured on an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heuristic {
    Md,
    Mdlc,
    Wd,
    Wdmd,
    Pd555,
    Pd663,
    Pd78,
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Heuristic::Md => "Manhattan Distance",
            Heuristic::Mdlc => "Manhattan Distance with Linear Conflict",
            Heuristic::Wd => "Walking Distance",
            Heuristic::Wdmd => "Walking Distance + Manhattan Distance with Linear Conflict",
            Heuristic::Pd555 => "Additive Pattern Database 555",
            Heuristic::Pd663 => "Additive Pattern Database 663",
            Heuristic::Pd78 => "Additive Pattern Database 78",
        };
        f.write_str(s)
    }
}

/// The only engine configuration trusted to write verified costs.
pub const CORE_ENGINE: (EngineKind, Heuristic) = (EngineKind::SmartPdb, Heuristic::Pd78);

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    #[error("search aborted on {board:?}")]
    Aborted { board: Board },
    #[error("no solution found for {board:?}")]
    NoSolution { board: Board },
}

/// Optimal sliding-tile solver consumed by the reference cache.
pub trait SearchEngine {
    fn kind(&self) -> EngineKind;
    fn heuristic(&self) -> Heuristic;

    /// Solve `board` optimally, starting the search at `lower_bound` moves.
    ///
    /// On success the result is available through [`solution`](Self::solution) and
    /// [`moves`](Self::moves) until the next search.
    fn find_optimal_path(&mut self, board: &Board, lower_bound: u8) -> Result<(), EngineError>;

    /// Blank moves of the last solution, first move first.
    fn solution(&self) -> &[Direction];
    /// Length of the last solution.
    fn moves(&self) -> u8;
    /// Wall time of the last search in seconds.
    fn search_time(&self) -> f64;
    fn is_search_timeout(&self) -> bool;
    fn last_search_board(&self) -> Option<Board>;

    fn heuristic_standard(&mut self, board: &Board) -> u8;
    /// Estimate that also consults the reference cache.
    fn heuristic_advanced(&mut self, board: &Board) -> u8;

    fn message_flag(&self) -> bool;
    fn set_message_flag(&mut self, on: bool);
    fn timeout_flag(&self) -> bool;
    fn set_timeout_flag(&mut self, on: bool);
    /// Whether the engine's heuristic currently consults the reference cache.
    fn in_use_advanced(&self) -> bool;
    fn set_in_use_advanced(&mut self, on: bool);
}

/// An engine may write to the cache only if it is the pattern-database engine on PD 7-8.
pub fn validate_engine<E: SearchEngine + ?Sized>(engine: &E) -> bool {
    (engine.kind(), engine.heuristic()) == CORE_ENGINE
}

/// Scoped override of an engine's toggles for cache maintenance.
///
/// While alive, diagnostics and timeouts are off and the cache-assisted heuristic is on.
/// The previous values are restored when the guard drops, including during unwinding.
pub struct EngineToggleGuard<'a, E: SearchEngine + ?Sized> {
    engine: &'a mut E,
    in_use_advanced: bool,
    message: bool,
    timeout: bool,
}

impl<'a, E: SearchEngine + ?Sized> EngineToggleGuard<'a, E> {
    pub fn new(engine: &'a mut E) -> Self {
        let in_use_advanced = engine.in_use_advanced();
        let message = engine.message_flag();
        let timeout = engine.timeout_flag();
        engine.set_timeout_flag(false);
        engine.set_message_flag(false);
        engine.set_in_use_advanced(true);
        Self { engine, in_use_advanced, message, timeout }
    }
}

impl<E: SearchEngine + ?Sized> Deref for EngineToggleGuard<'_, E> {
    type Target = E;
    fn deref(&self) -> &E { self.engine }
}

impl<E: SearchEngine + ?Sized> DerefMut for EngineToggleGuard<'_, E> {
    fn deref_mut(&mut self) -> &mut E { self.engine }
}

impl<E: SearchEngine + ?Sized> Drop for EngineToggleGuard<'_, E> {
    fn drop(&mut self) {
        self.engine.set_in_use_advanced(self.in_use_advanced);
        self.engine.set_message_flag(self.message);
        self.engine.set_timeout_flag(self.timeout);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// Scripted engine: answers each search with the next queued cost, or the lower bound.
    pub(crate) struct StubEngine {
        pub kind: EngineKind,
        pub heuristic: Heuristic,
        pub costs: VecDeque<u8>,
        pub path: Vec<Direction>,
        pub calls: Vec<(Board, u8)>,
        pub fail_on_call: Option<usize>,
        pub panic_on_call: Option<usize>,
        pub last_board: Option<Board>,
        pub last_moves: u8,
        pub last_time: f64,
        pub timed_out: bool,
        pub standard: u8,
        pub advanced: u8,
        pub message: bool,
        pub timeout: bool,
        pub advanced_on: bool,
    }

    impl StubEngine {
        pub(crate) fn core() -> Self {
            Self {
                kind: EngineKind::SmartPdb,
                heuristic: Heuristic::Pd78,
                costs: VecDeque::new(),
                path: vec![Direction::Left, Direction::Up, Direction::Right, Direction::Down],
                calls: Vec::new(),
                fail_on_call: None,
                panic_on_call: None,
                last_board: None,
                last_moves: 0,
                last_time: 0.0,
                timed_out: false,
                standard: 50,
                advanced: 50,
                message: true,
                timeout: true,
                advanced_on: false,
            }
        }

        pub(crate) fn with_costs(mut self, costs: &[u8]) -> Self {
            self.costs = costs.iter().copied().collect();
            self
        }

        /// Pretend the caller just finished solving `board` in `moves` after `seconds`.
        pub(crate) fn solved(mut self, board: Board, moves: u8, seconds: f64) -> Self {
            self.last_board = Some(board);
            self.last_moves = moves;
            self.last_time = seconds;
            self
        }

        pub(crate) fn toggles(&self) -> (bool, bool, bool) {
            (self.advanced_on, self.message, self.timeout)
        }
    }

    impl SearchEngine for StubEngine {
        fn kind(&self) -> EngineKind { self.kind }
        fn heuristic(&self) -> Heuristic { self.heuristic }

        fn find_optimal_path(&mut self, board: &Board, lower_bound: u8) -> Result<(), EngineError> {
            let call = self.calls.len();
            self.calls.push((*board, lower_bound));
            if self.panic_on_call == Some(call) {
                panic!("stub engine panic");
            }
            if self.fail_on_call == Some(call) {
                return Err(EngineError::Aborted { board: *board });
            }
            self.last_board = Some(*board);
            self.last_moves = self.costs.pop_front().unwrap_or(lower_bound);
            Ok(())
        }

        fn solution(&self) -> &[Direction] { &self.path }
        fn moves(&self) -> u8 { self.last_moves }
        fn search_time(&self) -> f64 { self.last_time }
        fn is_search_timeout(&self) -> bool { self.timed_out }
        fn last_search_board(&self) -> Option<Board> { self.last_board }
        fn heuristic_standard(&mut self, _board: &Board) -> u8 { self.standard }
        fn heuristic_advanced(&mut self, _board: &Board) -> u8 { self.advanced }
        fn message_flag(&self) -> bool { self.message }
        fn set_message_flag(&mut self, on: bool) { self.message = on; }
        fn timeout_flag(&self) -> bool { self.timeout }
        fn set_timeout_flag(&mut self, on: bool) { self.timeout = on; }
        fn in_use_advanced(&self) -> bool { self.advanced_on }
        fn set_in_use_advanced(&mut self, on: bool) { self.advanced_on = on; }
    }
}

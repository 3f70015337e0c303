use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::board::{Board, Direction};
use crate::config::{cutoff_limit, CacheConfig, CUTOFF_RANGE};
use crate::reference::key::CanonicalKey;
use crate::reference::record::{CacheRecord, NUM_PARTIAL_MOVES};
use crate::reference::seeds::default_map;
use crate::reference::symmetry::{group, lookup, mirror_lookup};
use crate::reference::ReferenceMap;
use crate::serialization::{self, ArchiveError};
use crate::solver::{validate_engine, EngineError, EngineToggleGuard, SearchEngine};

/// Cached knowledge about one physical board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceHit {
    /// Estimate stored for the board's slot.
    pub estimate: u8,
    /// Whether the estimate is an exact, verified cost.
    pub verified: bool,
    /// Leading moves for the board itself, when requested and stored.
    pub initial_moves: Option<[Direction; NUM_PARTIAL_MOVES]>,
}

/// Snapshot of the archive and the in-memory collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatus {
    pub path: PathBuf,
    pub file_size: Option<u64>,
    pub modified_unix_s: Option<u64>,
    pub cutoff_setting: i32,
    pub cutoff_limit: f64,
    pub records: usize,
    pub completed: usize,
}

/// Where a physical board lives in the collection.
#[derive(Debug, Clone, Copy)]
struct Resolved {
    key: CanonicalKey,
    slot: u8,
    reflect: bool,
}

/// Persistent, symmetry-aware collection of reference boards.
///
/// Holds the compiled-in seeds plus everything admitted from slow searches, keyed by
/// [`CanonicalKey`]. Every mutation is appended to the archive; startup, cutoff changes,
/// and resets rewrite it in full. Write failures are logged and leave the in-memory
/// collection authoritative.
pub struct ReferenceAccumulator {
    path: PathBuf,
    default_cutoff: i32,
    cutoff_buffer: i32,
    cutoff_setting: i32,
    cutoff_limit: f64,
    default_map: ReferenceMap,
    active: ReferenceMap,
    file_ready: bool,
}

impl ReferenceAccumulator {
    /// Load the archive without verifying anything, then rewrite it compactly.
    ///
    /// A missing or corrupt archive is replaced by the default collection.
    pub fn open(config: &CacheConfig) -> Self {
        let mut acc = Self::load(config);
        acc.refresh_file();
        acc
    }

    /// Load the archive, verify every incomplete record with an engine built by `factory`,
    /// then rewrite the archive compactly.
    pub fn open_with<E, F>(config: &CacheConfig, factory: F) -> Self
    where
        E: SearchEngine,
        F: FnOnce() -> Result<E, EngineError>,
    {
        let mut acc = Self::load(config);
        acc.update_data(factory);
        acc.refresh_file();
        acc
    }

    fn load(config: &CacheConfig) -> Self {
        let cutoff_buffer = config.effective_cutoff_buffer();
        let default_cutoff = config.effective_default_cutoff();
        let default_map = default_map();
        let mut acc = Self {
            path: config.path.clone(),
            default_cutoff,
            cutoff_buffer,
            cutoff_setting: default_cutoff,
            cutoff_limit: cutoff_limit(default_cutoff, cutoff_buffer),
            active: default_map.clone(),
            default_map,
            file_ready: false,
        };
        match acc.load_file() {
            Ok(n) => log::info!("loaded {n} reference records from {}", acc.path.display()),
            Err(ArchiveError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                let path = acc.path.display();
                log::info!("no reference archive at {path}, starting from defaults");
                acc.reset_state();
            }
            Err(e) => {
                let path = acc.path.display();
                log::warn!("reference archive {path} unreadable ({e}), restoring defaults");
                acc.reset_state();
            }
        }
        acc
    }

    fn load_file(&mut self) -> Result<usize, ArchiveError> {
        let archive = serialization::read_archive(&self.path)?;
        let (lo, hi) = CUTOFF_RANGE;
        if (lo..=hi).contains(&archive.cutoff) {
            self.set_cutoff(archive.cutoff);
        } else {
            log::warn!(
                "stored cutoff {} out of range, using {}",
                archive.cutoff,
                self.default_cutoff
            );
            self.set_cutoff(self.default_cutoff);
        }
        let n = archive.entries.len();
        for (key, record) in archive.entries {
            self.active
                .entry(key)
                .and_modify(|r| r.update_moves(&record))
                .or_insert(record);
        }
        self.file_ready = true;
        Ok(n)
    }

    fn set_cutoff(&mut self, setting: i32) {
        self.cutoff_setting = setting;
        self.cutoff_limit = cutoff_limit(setting, self.cutoff_buffer);
    }

    fn reset_state(&mut self) {
        self.set_cutoff(self.default_cutoff);
        self.active = self.default_map.clone();
    }

    /// Restore the default collection and cutoff, and rewrite the archive.
    pub fn reset(&mut self) {
        self.reset_state();
        log::info!("default setting: cutoff archive limit {}s", self.cutoff_setting);
        self.refresh_file();
    }

    fn create_file(&mut self) {
        self.file_ready = false;
        match serialization::create_archive(&self.path, self.cutoff_setting) {
            Ok(()) => self.file_ready = true,
            Err(e) => log::error!("unable to create {}: {e}", self.path.display()),
        }
    }

    fn append(&mut self, key: &CanonicalKey) {
        if !self.file_ready {
            self.create_file();
            if !self.file_ready { return; }
        }
        let Some(record) = self.active.get(key) else { return };
        if let Err(e) = serialization::append_record(&self.path, key, record) {
            log::error!("write to {} failed: {e}", self.path.display());
            self.file_ready = false;
        }
    }

    /// Rewrite the archive from the in-memory collection.
    pub fn refresh_file(&mut self) {
        match serialization::write_archive(&self.path, self.cutoff_setting, self.active.iter()) {
            Ok(()) => self.file_ready = true,
            Err(e) => {
                log::error!("unable to save {}: {e}", self.path.display());
                self.file_ready = false;
            }
        }
    }

    /// Build an engine with `factory` and verify every incomplete record with it.
    ///
    /// A factory failure is logged and leaves the collection untouched.
    pub fn update_data<E, F>(&mut self, factory: F)
    where
        E: SearchEngine,
        F: FnOnce() -> Result<E, EngineError>,
    {
        let mut engine = match factory() {
            Ok(e) => e,
            Err(e) => {
                log::warn!("reference update skipped, not enough memory for the engine: {e}");
                return;
            }
        };
        if !validate_engine(&engine) {
            log::warn!("reference update skipped, engine is not {:?}", crate::solver::CORE_ENGINE);
            return;
        }
        if let Err(e) = self.update_all(&mut engine) {
            log::error!("reference update interrupted: {e}");
        }
    }

    /// Verify every incomplete record with a caller-owned engine. Invalid engines are ignored.
    pub fn update_pending<E>(&mut self, engine: &mut E) -> Result<(), EngineError>
    where
        E: SearchEngine + ?Sized,
    {
        if !validate_engine(engine) {
            return Ok(());
        }
        self.update_all(engine)
    }

    fn update_all<E: SearchEngine + ?Sized>(&mut self, engine: &mut E) -> Result<(), EngineError> {
        let mut engine = EngineToggleGuard::new(engine);
        let pending: Vec<CanonicalKey> = self
            .active
            .iter()
            .filter(|(_, r)| !r.is_completed())
            .map(|(k, _)| *k)
            .collect();
        if !pending.is_empty() {
            log::info!("verifying {} reference boards", pending.len());
        }
        for key in pending {
            self.sweep(&key, &mut *engine)?;
        }
        Ok(())
    }

    /// Run the verification sweep on one record and persist whatever it finished.
    fn sweep<E>(&mut self, key: &CanonicalKey, engine: &mut E) -> Result<(), EngineError>
    where
        E: SearchEngine + ?Sized,
    {
        let result = match self.active.get_mut(key) {
            Some(record) => record.update_solutions(key, engine),
            None => return Ok(()),
        };
        self.append(key);
        result
    }

    /// Canonical entry for `board`, falling back to its mirror entry for groups 0 and 2.
    fn resolve(&self, board: &Board) -> Option<Resolved> {
        let blank = board.zero_pos();
        let slot = lookup(blank);
        let key = CanonicalKey::from_board(board);
        if self.active.contains_key(&key) {
            return Some(Resolved { key, slot, reflect: group(blank) == 3 });
        }
        CanonicalKey::mirror_of(board)
            .filter(|k| self.active.contains_key(k))
            .map(|key| Resolved { key, slot: mirror_lookup(slot), reflect: true })
    }

    /// Admit the engine's last search.
    ///
    /// Without `bypass` the search must have taken at least the cutoff limit, and when the
    /// engine is not using the cache its standard and cache-assisted estimates must agree.
    /// With `bypass` an incomplete record is verified in full before returning.
    pub fn add_board<E>(&mut self, engine: &mut E, bypass: bool) -> Result<bool, EngineError>
    where
        E: SearchEngine + ?Sized,
    {
        if !validate_engine(engine) {
            return Ok(false);
        }
        if !bypass && engine.search_time() < self.cutoff_limit {
            return Ok(false);
        }
        let Some(board) = engine.last_search_board() else { return Ok(false) };
        let solution = engine.solution().to_vec();
        let moves = engine.moves();

        if !bypass && !engine.in_use_advanced() {
            let standard = engine.heuristic_standard(&board);
            let advanced = engine.heuristic_advanced(&board);
            if standard != advanced {
                return Ok(false);
            }
        }

        let mut engine = EngineToggleGuard::new(engine);
        let blank = board.zero_pos();
        let target = self.resolve(&board).unwrap_or_else(|| Resolved {
            key: CanonicalKey::from_board(&board),
            slot: lookup(blank),
            reflect: group(blank) == 3,
        });
        let record = self
            .active
            .entry(target.key)
            .or_insert_with(|| CacheRecord::provisional(blank, moves));
        record.update_solution(target.slot, moves, &solution, target.reflect);
        log::debug!("admitted {:?} slot {} at {moves} moves", target.key, target.slot);

        if bypass && !record.is_completed() {
            self.sweep(&target.key, &mut *engine)?;
        } else {
            self.append(&target.key);
        }
        Ok(true)
    }

    /// Complete the record of the engine's last search if it was slow enough to matter.
    ///
    /// Returns whether the board has a record at all.
    pub fn update_last_search<E>(&mut self, engine: &mut E) -> Result<bool, EngineError>
    where
        E: SearchEngine + ?Sized,
    {
        if !validate_engine(engine) {
            return Ok(false);
        }
        if engine.is_search_timeout() || engine.search_time() < self.cutoff_limit {
            return Ok(false);
        }
        let Some(board) = engine.last_search_board() else { return Ok(false) };
        let Some(target) = self.resolve(&board) else { return Ok(false) };

        let incomplete = self.active.get(&target.key).is_some_and(|r| !r.is_completed());
        if incomplete {
            log::info!("updating reference board {:?}, please wait", target.key);
            let mut engine = EngineToggleGuard::new(engine);
            self.sweep(&target.key, &mut *engine)?;
        }
        Ok(true)
    }

    /// Change the cutoff setting to `seconds` in [1, 10] and rewrite the archive.
    ///
    /// Out-of-range or unchanged values are reported and ignored. Existing records stay.
    pub fn set_cutoff_archive(&mut self, seconds: i32) -> bool {
        let (lo, hi) = CUTOFF_RANGE;
        if seconds < lo {
            log::warn!("{seconds} below minimum cutoff limit {lo}s, no change");
            return false;
        }
        if seconds > hi {
            log::warn!("{seconds} above maximum cutoff limit {hi}s, no change");
            return false;
        }
        if seconds == self.cutoff_setting {
            log::warn!("same cutoff limit, no change");
            return false;
        }
        self.set_cutoff(seconds);
        log::info!(
            "cutoff archive limit changed to {seconds}s, existing reference boards remain as is"
        );
        self.refresh_file();
        true
    }

    /// Drop `board`'s canonical entry unless it is one of the defaults.
    pub fn remove_board(&mut self, board: &Board) -> bool {
        let key = CanonicalKey::from_board(board);
        if self.default_map.contains_key(&key) {
            return false;
        }
        let removed = self.active.remove(&key).is_some();
        if removed {
            self.refresh_file();
        }
        removed
    }

    pub fn contains_board(&self, board: &Board) -> bool {
        self.resolve(board).is_some()
    }

    /// Stored estimate for `board`, plus its leading moves when `in_search` and stored.
    pub fn lookup(&self, board: &Board, in_search: bool) -> Option<ReferenceHit> {
        let target = self.resolve(board)?;
        let record = self.active.get(&target.key)?;
        let initial_moves = (in_search && record.has_initial_moves(target.slot))
            .then(|| record.initial_moves(target.slot, target.reflect));
        Some(ReferenceHit {
            estimate: record.estimate(target.slot),
            verified: record.is_verified(target.slot),
            initial_moves,
        })
    }

    pub fn has_partial_solution(&self, board: &Board) -> bool {
        self.resolve(board)
            .and_then(|t| self.active.get(&t.key).map(|r| r.has_initial_moves(t.slot)))
            .unwrap_or(false)
    }

    pub fn is_default(&self, key: &CanonicalKey) -> bool {
        self.default_map.contains_key(key)
    }

    pub fn active_map(&self) -> &ReferenceMap { &self.active }

    pub fn cutoff_setting(&self) -> i32 { self.cutoff_setting }

    pub fn cutoff_limit(&self) -> f64 { self.cutoff_limit }

    pub fn path(&self) -> &Path { &self.path }

    pub fn status(&self) -> CacheStatus {
        let meta = fs::metadata(&self.path).ok();
        let modified_unix_s = meta
            .as_ref()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs());
        CacheStatus {
            path: self.path.clone(),
            file_size: meta.map(|m| m.len()),
            modified_unix_s,
            cutoff_setting: self.cutoff_setting,
            cutoff_limit: self.cutoff_limit,
            records: self.active.len(),
            completed: self.active.values().filter(|r| r.is_completed()).count(),
        }
    }
}

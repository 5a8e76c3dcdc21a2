use lazy_static::lazy_static;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::models::CrownPolygon;

/// Holds the crown collection currently shown by the viewer.
///
/// Every load takes a generation number when it starts. Only the most recently
/// started load may commit, and a commit swaps the whole collection at once, so
/// readers see either the previous dataset or the new one, never a mix.
pub struct CrownSession {
    crowns: Arc<Vec<CrownPolygon>>,
    latest_generation: u64,
}

// Create a global static instance of the session
lazy_static! {
    static ref SESSION: Mutex<CrownSession> = Mutex::new(CrownSession::new());
}

impl CrownSession {
    pub fn new() -> Self {
        CrownSession {
            crowns: Arc::new(Vec::new()),
            latest_generation: 0,
        }
    }

    pub fn global() -> &'static Mutex<CrownSession> {
        &SESSION
    }

    /// Register a new load and return its generation.
    pub fn begin_load(&mut self) -> u64 {
        self.latest_generation += 1;
        self.latest_generation
    }

    /// Publish the result of load `generation`. Returns `false` (and drops the
    /// result) when a newer load has started in the meantime.
    pub fn commit(&mut self, generation: u64, crowns: Vec<CrownPolygon>) -> bool {
        if generation != self.latest_generation {
            return false;
        }
        self.crowns = Arc::new(crowns);
        true
    }

    pub fn crowns(&self) -> Arc<Vec<CrownPolygon>> {
        Arc::clone(&self.crowns)
    }

    pub fn clear(&mut self) {
        self.latest_generation += 1;
        self.crowns = Arc::new(Vec::new());
    }
}

impl Default for CrownSession {
    fn default() -> Self {
        Self::new()
    }
}

use crate::moves::types::Move;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Deep enough for the depth ceiling plus check extensions.
pub const MAX_PLY: usize = 128;
pub const NUM_KILLERS: usize = 3;

/// The cooperative cancellation token: a single atomic flag set once by a
/// detached timer thread and polled at every node entry and after every
/// child. Nothing else is shared with the timer.
#[derive(Clone)]
pub struct SearchClock {
    time_up: Arc<AtomicBool>,
}

impl SearchClock {
    /// A clock that never fires (analysis / tests).
    pub fn unlimited() -> Self {
        SearchClock {
            time_up: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Arm a single-shot alarm `budget` from now.
    pub fn start(budget: Duration) -> Self {
        let clock = SearchClock::unlimited();
        let flag = Arc::clone(&clock.time_up);
        thread::spawn(move || {
            thread::sleep(budget);
            flag.store(true, Ordering::Relaxed);
        });
        clock
    }

    #[inline(always)]
    pub fn time_up(&self) -> bool {
        self.time_up.load(Ordering::Relaxed)
    }

    /// Trip the flag by hand (protocol "stop", tests).
    pub fn stop(&self) {
        self.time_up.store(true, Ordering::Relaxed);
    }
}

/// Per-search mutable state: the killer table and the bookkeeping the
/// iterative deepener and the transposition writes need.
pub struct SearchContext {
    /// Quiet non-castle cutoff moves, a few per ply, tried before full
    /// generation. Rows are cleared as their subtree is left behind.
    pub killers: [[Option<Move>; NUM_KILLERS]; MAX_PLY],
    pub clock: SearchClock,
    pub nodes: u64,
    pub lazy_evals: u64,
    pub full_evals: u64,
}

impl SearchContext {
    pub fn new(clock: SearchClock) -> Self {
        SearchContext {
            killers: [[None; NUM_KILLERS]; MAX_PLY],
            clock,
            nodes: 0,
            lazy_evals: 0,
            full_evals: 0,
        }
    }

    pub fn clear_killers(&mut self) {
        self.killers = [[None; NUM_KILLERS]; MAX_PLY];
    }

    /// Clear one ply's row; done whenever a node finishes its children so a
    /// sibling subtree cannot inherit moves that are illegal there.
    #[inline]
    pub fn clear_killer_row(&mut self, ply: usize) {
        if ply < MAX_PLY {
            self.killers[ply] = [None; NUM_KILLERS];
        }
    }

    /// Record a cutoff move: first empty slot, else replace the last.
    pub fn insert_killer(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        let row = &mut self.killers[ply];
        for slot in row.iter_mut() {
            match slot {
                Some(existing) if existing.same_as(&mv) => return,
                None => {
                    *slot = Some(mv);
                    return;
                }
                _ => {}
            }
        }
        row[NUM_KILLERS - 1] = Some(mv);
    }
}

use crate::board::{Board, Color};
use crate::book::{BOOK_FILENAME, OpeningBook};
use crate::moves::execute::{find_legal, generate_legal, make_move};
use crate::moves::magic::MagicTables;
use crate::moves::magic::loader::load_magic_tables;
use crate::moves::square_control::RegenCache;
use crate::moves::types::Move;
use crate::search::pawns::PawnCache;
use crate::search::search::best_move;
use crate::search::tt::TranspositionTable;
use crate::status::{GameStatus, position_status};
use std::time::Duration;
use tracing::info;

/// Longest game line the book matcher will track.
const LINE_MAX_LENGTH: usize = 1024;

/// The engine facade the protocol adapter talks to. Owns the position, the
/// read-only attack tables, and the process-lifetime caches — which survive
/// `new_game` untouched: their hash keys make stale entries self-correcting,
/// and the transposition replacement policy recycles entries from before the
/// current root on its own.
pub struct Engine {
    board: Board,
    tables: MagicTables,
    tt: TranspositionTable,
    pawn_cache: PawnCache,
    regen: RegenCache,
    book: Option<OpeningBook>,
    /// The game's moves in wire form, space-terminated ("e2e4 e7e5 ").
    line: String,
    in_book: bool,
    /// Clock state in seconds, fed by the adapter.
    time_remaining: i64,
    time_increment: i64,
}

impl Engine {
    pub fn new() -> Self {
        let tables = load_magic_tables();
        let board = Board::new(&tables);
        Engine {
            board,
            tables,
            tt: TranspositionTable::default(),
            pawn_cache: PawnCache::default(),
            regen: RegenCache::default(),
            book: OpeningBook::open(BOOK_FILENAME),
            line: String::new(),
            in_book: true,
            time_remaining: 0,
            time_increment: 0,
        }
    }

    /// Discard the current game and set up the starting array. Caches are
    /// deliberately kept.
    pub fn new_game(&mut self) {
        self.board = Board::new(&self.tables);
        self.line.clear();
        self.in_book = self.book.is_some();
    }

    pub fn set_clock(&mut self, remaining_secs: i64, increment_secs: i64) {
        self.time_remaining = remaining_secs;
        self.time_increment = increment_secs;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn fen(&self) -> String {
        self.board.to_fen()
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move
    }

    /// Think for `(increment + remaining/30) − 1` seconds once the opening is
    /// behind us, a thriftier `(increment + remaining/60) − 1` before move
    /// 20, and never less than a second (lightning clocks go negative here).
    fn allocate_time(&self) -> Duration {
        let divisor = if self.board.plies > 20 { 30 } else { 60 };
        let secs = self.time_increment + self.time_remaining / divisor - 1;
        Duration::from_secs(secs.max(1) as u64)
    }

    fn record(&mut self, mv: Move) {
        if self.line.len() < LINE_MAX_LENGTH - 6 {
            self.line.push_str(&mv.to_text());
            self.line.push(' ');
        }
    }

    /// Parse and legality-check a move; on success the position is mutated.
    /// The error carries the reason for the adapter's "Illegal move" reply.
    pub fn submit_move(&mut self, text: &str) -> Result<(), String> {
        match find_legal(&mut self.board, &self.tables, &mut self.regen, text) {
            Some(mv) => {
                make_move(&mut self.board, mv, &self.tables, &mut self.regen);
                self.record(mv);
                Ok(())
            }
            None => Err(format!("illegal move in this position: {}", text)),
        }
    }

    /// Produce a move for the side to play: the book while we are still in
    /// it, the searcher afterwards. The move is applied before returning.
    pub fn request_move(&mut self) -> Option<String> {
        if self.in_book {
            let book_mv = self.book.as_ref().and_then(|b| {
                b.probe(
                    &self.line,
                    &mut self.board,
                    &self.tables,
                    &mut self.regen,
                )
            });
            match book_mv {
                Some(mv) => {
                    info!(%mv, "book lookup successful");
                    make_move(&mut self.board, mv, &self.tables, &mut self.regen);
                    self.record(mv);
                    return Some(mv.to_text());
                }
                None => {
                    info!("leaving opening book lines");
                    self.in_book = false;
                }
            }
        }

        let budget = self.allocate_time();
        let report = best_move(
            &mut self.board,
            &self.tables,
            &mut self.tt,
            &mut self.pawn_cache,
            &mut self.regen,
            Some(budget),
        );

        let chosen = report.mv.or_else(|| {
            // no move from the search means the game is over; the legal
            // check below is a belt against ever forfeiting on a glitch
            let mut legal = Vec::with_capacity(64);
            generate_legal(&mut self.board, &self.tables, &mut self.regen, &mut legal);
            legal.first().copied()
        })?;

        make_move(&mut self.board, chosen, &self.tables, &mut self.regen);
        self.record(chosen);
        Some(chosen.to_text())
    }

    pub fn check_game_over(&mut self) -> GameStatus {
        position_status(&mut self.board, &self.tables, &mut self.regen)
    }

    /// Movegen debugging entry: per-root-move leaf counts from the current
    /// position.
    pub fn perft(&mut self, depth: u32) -> u64 {
        crate::moves::perft::perft_divide(&mut self.board, &self.tables, &mut self.regen, depth)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

use crate::board::Board;
use crate::moves::execute::find_legal;
use crate::moves::magic::MagicTables;
use crate::moves::square_control::RegenCache;
use crate::moves::types::Move;
use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const BOOK_FILENAME: &str = "book.txt";

/// A plain-text opening book: each line is one opening, moves in wire form
/// separated by single spaces with a trailing space ("e2e4 e7e5 g1f3 ").
/// Lookup matches the game's move line as a string prefix, collects the move
/// that follows the prefix on each matching book line, filters by legality
/// and picks uniformly at random.
pub struct OpeningBook {
    path: PathBuf,
}

impl OpeningBook {
    pub fn open<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref().to_path_buf();
        if path.is_file() {
            Some(OpeningBook { path })
        } else {
            info!(?path, "no opening book found");
            None
        }
    }

    /// Look up a move for the game line so far (same trailing-space format
    /// as the book lines; empty string for the starting position).
    pub fn probe(
        &self,
        line: &str,
        board: &mut Board,
        tables: &MagicTables,
        regen: &mut RegenCache,
    ) -> Option<Move> {
        // hard-coded taste: open 1.e4, meet 1.e4 with the Sicilian — sharp
        // tactical positions suit an engine better than closed ones
        if line.is_empty() {
            return find_legal(board, tables, regen, "e2e4");
        }
        if line == "e2e4 " {
            return find_legal(board, tables, regen, "c7c5");
        }

        let file = File::open(&self.path).ok()?;
        let reader = BufReader::new(file);

        let mut candidates: Vec<Move> = Vec::new();
        for book_line in reader.lines() {
            let Ok(book_line) = book_line else { break };
            if !book_line.starts_with(line) {
                continue;
            }
            let Some(next) = book_line[line.len()..].split_whitespace().next() else {
                continue;
            };
            if let Some(mv) = find_legal(board, tables, regen, next)
                && !candidates.iter().any(|c| c.same_as(&mv))
            {
                candidates.push(mv);
            }
        }

        if candidates.is_empty() {
            debug!(line, "no book continuation");
            return None;
        }
        let pick = rand::rng().random_range(0..candidates.len());
        debug!(
            line,
            total = candidates.len(),
            chosen = %candidates[pick],
            "book lookup successful"
        );
        Some(candidates[pick])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::loader::load_magic_tables;
    use std::io::Write;

    fn temp_book(contents: &str) -> PathBuf {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let mut path = std::env::temp_dir();
        path.push(format!(
            "gambit-book-test-{}-{}.txt",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn start_position_always_plays_e4() {
        let tables = load_magic_tables();
        let mut regen = RegenCache::new(1 << 8);
        let mut board = Board::new(&tables);
        let path = temp_book("d2d4 d7d5 c2c4 \n");
        let book = OpeningBook::open(&path).unwrap();
        let mv = book.probe("", &mut board, &tables, &mut regen).unwrap();
        assert_eq!(mv.to_text(), "e2e4");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn sicilian_override_after_e4() {
        let tables = load_magic_tables();
        let mut regen = RegenCache::new(1 << 8);
        let mut board = Board::new(&tables);
        let mv = find_legal(&mut board, &tables, &mut regen, "e2e4").unwrap();
        crate::moves::execute::make_move(&mut board, mv, &tables, &mut regen);

        let path = temp_book("e2e4 e7e5 g1f3 \n");
        let book = OpeningBook::open(&path).unwrap();
        let reply = book
            .probe("e2e4 ", &mut board, &tables, &mut regen)
            .unwrap();
        assert_eq!(reply.to_text(), "c7c5");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn prefix_match_returns_the_next_move() {
        let tables = load_magic_tables();
        let mut regen = RegenCache::new(1 << 8);
        let mut board = Board::new(&tables);
        for text in ["e2e4", "c7c5"] {
            let mv = find_legal(&mut board, &tables, &mut regen, text).unwrap();
            crate::moves::execute::make_move(&mut board, mv, &tables, &mut regen);
        }

        let path = temp_book(
            "e2e4 c7c5 g1f3 d7d6 d2d4 \n\
             e2e4 c7c5 b1c3 b8c6 \n\
             d2d4 g8f6 c2c4 \n",
        );
        let book = OpeningBook::open(&path).unwrap();
        let mv = book
            .probe("e2e4 c7c5 ", &mut board, &tables, &mut regen)
            .expect("both knight moves are book");
        assert!(mv.to_text() == "g1f3" || mv.to_text() == "b1c3");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn off_book_line_misses() {
        let tables = load_magic_tables();
        let mut regen = RegenCache::new(1 << 8);
        let mut board = Board::new(&tables);
        for text in ["a2a3", "a7a6"] {
            let mv = find_legal(&mut board, &tables, &mut regen, text).unwrap();
            crate::moves::execute::make_move(&mut board, mv, &tables, &mut regen);
        }
        let path = temp_book("e2e4 c7c5 g1f3 \n");
        let book = OpeningBook::open(&path).unwrap();
        assert!(
            book.probe("a2a3 a7a6 ", &mut board, &tables, &mut regen)
                .is_none()
        );
        let _ = std::fs::remove_file(path);
    }
}

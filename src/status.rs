use crate::board::{Board, Color};
use crate::moves::execute::generate_legal;
use crate::moves::magic::MagicTables;
use crate::moves::square_control::{RegenCache, in_check};

/// Game outcome classification. Threefold and fifty-move are reported
/// separately from the terminal outcomes because a draw of that kind may
/// need to be claimed rather than being automatic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InPlay,
    /// The named color has been checkmated.
    Checkmate(Color),
    /// The named color has no move but is not in check.
    Stalemate(Color),
    DrawThreefold,
    DrawFiftyMove,
}

pub fn is_draw_by_threefold(board: &Board) -> bool {
    board.repetitions >= 2
}

pub fn is_draw_by_fifty_move(board: &Board) -> bool {
    board.halfmove_clock >= 100
}

/// Classify the current position by exhaustive legal generation: the game is
/// over iff no legal move exists, with check deciding mate versus stalemate.
/// Claimable draws are checked first.
pub fn position_status(
    board: &mut Board,
    tables: &MagicTables,
    regen: &mut RegenCache,
) -> GameStatus {
    let to_move = board.side_to_move;

    if is_draw_by_threefold(board) {
        return GameStatus::DrawThreefold;
    }
    if is_draw_by_fifty_move(board) {
        return GameStatus::DrawFiftyMove;
    }

    let mut legal = Vec::with_capacity(64);
    generate_legal(board, tables, regen, &mut legal);
    if legal.is_empty() {
        if in_check(board, to_move) {
            GameStatus::Checkmate(to_move)
        } else {
            GameStatus::Stalemate(to_move)
        }
    } else {
        GameStatus::InPlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::loader::load_magic_tables;

    fn status_of(fen: &str) -> GameStatus {
        let tables = load_magic_tables();
        let mut board = Board::from_fen(fen, &tables).unwrap();
        let mut regen = RegenCache::new(1 << 10);
        position_status(&mut board, &tables, &mut regen)
    }

    #[test]
    fn fresh_game_is_in_play() {
        assert_eq!(
            status_of("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            GameStatus::InPlay
        );
    }

    #[test]
    fn back_rank_mate_is_checkmate() {
        assert_eq!(
            status_of("R5k1/5ppp/8/8/8/8/8/4K3 b - - 0 1"),
            GameStatus::Checkmate(Color::Black)
        );
    }

    #[test]
    fn cornered_king_is_stalemate() {
        assert_eq!(
            status_of("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1"),
            GameStatus::Stalemate(Color::Black)
        );
    }

    #[test]
    fn hundred_halfmoves_is_a_fifty_move_draw() {
        assert_eq!(
            status_of("4k3/8/8/8/8/8/8/R3K3 w - - 100 80"),
            GameStatus::DrawFiftyMove
        );
    }
}

use crate::board::castle_bits::*;
use crate::board::{Board, Color, HISTORY_STACK_LIMIT, Piece};
use crate::hash::zobrist::{xor_castling_rights_delta, zobrist_keys};
use crate::moves::list::MoveList;
use crate::moves::magic::MagicTables;
use crate::moves::movegen::generate_moves;
use crate::moves::square_control::{RegenCache, in_check, regenerate_attacks};
use crate::moves::types::{Move, Undo, parse_move_text};
use crate::square::Square;
use tracing::debug;

/// Castling rook relocation by king destination index.
#[inline(always)]
fn rook_castle_squares(king_to_idx: u8) -> Option<(Square, Square)> {
    match king_to_idx {
        6 => Some((Square::from_index(7), Square::from_index(5))), // White O-O
        2 => Some((Square::from_index(0), Square::from_index(3))), // White O-O-O
        62 => Some((Square::from_index(63), Square::from_index(61))), // Black O-O
        58 => Some((Square::from_index(56), Square::from_index(59))), // Black O-O-O
        _ => None,
    }
}

/// Which castle right dies when a rook moves from (or is captured on) `sq`.
#[inline(always)]
fn rights_mask_for_rook(color: Color, rook_sq: u8) -> u8 {
    match (color, rook_sq) {
        (Color::White, 0) => CASTLE_WQ,
        (Color::White, 7) => CASTLE_WK,
        (Color::Black, 56) => CASTLE_BQ,
        (Color::Black, 63) => CASTLE_BK,
        _ => 0,
    }
}

#[inline(always)]
fn remove_piece(board: &mut Board, color: Color, piece: Piece, idx: usize) {
    let new_bb = board.bb(color, piece) & !(1u64 << idx);
    board.set_bb(color, piece, new_bb);
}

#[inline(always)]
fn place_piece(board: &mut Board, color: Color, piece: Piece, idx: usize) {
    let new_bb = board.bb(color, piece) | (1u64 << idx);
    board.set_bb(color, piece, new_bb);
}

/// Scan back through the undo stack for the most recent position (within the
/// reversible window) whose hash matches the board's. Its stored count plus
/// one is our count; no match means zero.
fn recompute_repetitions(board: &Board) -> u8 {
    let window = (board.halfmove_clock as usize).min(board.history.len());
    let len = board.history.len();
    for i in 0..window {
        let entry = &board.history[len - 1 - i];
        if entry.prev_hash == board.zobrist {
            return entry.prev_repetitions + 1;
        }
    }
    0
}

/// Apply `mv`, updating every piece of incremental state: bitboards, hash,
/// castle rights, ep square, clocks, material, repetition count and the
/// attack masks (through the regen cache). Pushes the undo record.
pub fn make_move(board: &mut Board, mv: Move, tables: &MagicTables, regen: &mut RegenCache) {
    let keys = zobrist_keys();
    let color = board.side_to_move;
    let from_idx = mv.from.index() as usize;
    let to_idx = mv.to.index() as usize;

    assert!(
        board.history.len() < HISTORY_STACK_LIMIT,
        "undo stack exceeded {} plies",
        HISTORY_STACK_LIMIT
    );
    debug_assert!(
        board.piece_at(mv.from) == Some((color, mv.piece)),
        "no {:?} {:?} on {}",
        color,
        mv.piece,
        mv.from
    );

    // identify the capture before anything moves
    let capture = if mv.is_en_passant() {
        let cap_idx = if color == Color::White {
            to_idx - 8
        } else {
            to_idx + 8
        };
        Some((
            color.opposite(),
            Piece::Pawn,
            Square::from_index(cap_idx as u8),
        ))
    } else {
        board.piece_at(mv.to).map(|(c, p)| (c, p, mv.to))
    };
    debug_assert_eq!(capture.is_some(), mv.is_capture(), "capture flag mismatch");

    let castling_rook = if mv.is_castling() {
        rook_castle_squares(to_idx as u8)
    } else {
        None
    };

    board.history.push(Undo {
        mv: Some(mv),
        prev_hash: board.zobrist,
        prev_attacked_by: board.attacked_by,
        prev_castling_rights: board.castling_rights,
        prev_has_castled: board.has_castled,
        prev_en_passant: board.en_passant,
        prev_halfmove_clock: board.halfmove_clock,
        prev_repetitions: board.repetitions,
        capture,
        castling_rook,
    });

    // remove the captured piece and its material
    if let Some((cap_color, cap_piece, cap_sq)) = capture {
        remove_piece(board, cap_color, cap_piece, cap_sq.index() as usize);
        board.material[cap_color as usize] -= cap_piece.value();
    }

    // ep token out; the new token goes in once the new square is known
    board.zobrist ^= keys.ep[board.ep_index()];
    board.en_passant = None;

    // clocks
    if capture.is_some() || mv.piece == Piece::Pawn {
        board.halfmove_clock = 0;
    } else {
        board.halfmove_clock += 1;
    }
    board.plies += 1;

    // castling rook relocation
    if let Some((rook_from, rook_to)) = castling_rook {
        remove_piece(board, color, Piece::Rook, rook_from.index() as usize);
        place_piece(board, color, Piece::Rook, rook_to.index() as usize);
        board.has_castled[color as usize] = true;
    }

    // move the piece itself; promotions swap the pawn out
    remove_piece(board, color, mv.piece, from_idx);
    if let Some(promo) = mv.promotion {
        debug_assert!(mv.piece == Piece::Pawn, "only pawns promote");
        place_piece(board, color, promo, to_idx);
        board.material[color as usize] += promo.value() - Piece::Pawn.value();
    } else {
        place_piece(board, color, mv.piece, to_idx);
    }

    // double push opens an ep square on the traversed square
    if mv.is_double_pawn_push() {
        let ep_idx = if color == Color::White {
            from_idx + 8
        } else {
            from_idx - 8
        };
        board.en_passant = Some(Square::from_index(ep_idx as u8));
    }
    board.zobrist ^= keys.ep[board.ep_index()];

    // castle rights: king moves clear both, rook moves from a corner clear
    // one, and capturing a rook on its corner clears the opponent's
    let mut mask_to_clear = 0u8;
    if mv.piece == Piece::King {
        mask_to_clear |= match color {
            Color::White => CASTLE_WK | CASTLE_WQ,
            Color::Black => CASTLE_BK | CASTLE_BQ,
        };
    }
    if mv.piece == Piece::Rook {
        mask_to_clear |= rights_mask_for_rook(color, mv.from.index());
    }
    if let Some((cap_color, Piece::Rook, cap_sq)) = capture {
        mask_to_clear |= rights_mask_for_rook(cap_color, cap_sq.index());
    }
    let new_rights = board.castling_rights & !mask_to_clear;
    if new_rights != board.castling_rights {
        xor_castling_rights_delta(&mut board.zobrist, keys, board.castling_rights, new_rights);
        board.castling_rights = new_rights;
    }

    // flip the side to move
    board.side_to_move = color.opposite();
    board.zobrist ^= keys.side_to_move;

    board.repetitions = recompute_repetitions(board);
    regenerate_attacks(board, tables, regen);

    #[cfg(debug_assertions)]
    board.assert_hash();
}

/// Reverse the most recent make (or null move), replaying the Zobrist XORs
/// and restoring the non-recomputable state from the undo record.
pub fn unmake_move(board: &mut Board) {
    let undo = board.history.pop().expect("unmake with empty history");
    let keys = zobrist_keys();

    // ep token of the current position out
    board.zobrist ^= keys.ep[board.ep_index()];

    // side back
    board.side_to_move = board.side_to_move.opposite();
    board.zobrist ^= keys.side_to_move;
    let color = board.side_to_move;

    // castle rights back, hash delta replayed
    if board.castling_rights != undo.prev_castling_rights {
        xor_castling_rights_delta(
            &mut board.zobrist,
            keys,
            board.castling_rights,
            undo.prev_castling_rights,
        );
        board.castling_rights = undo.prev_castling_rights;
    }
    board.has_castled = undo.prev_has_castled;

    if let Some(mv) = undo.mv {
        let from_idx = mv.from.index() as usize;
        let to_idx = mv.to.index() as usize;

        if let Some(promo) = mv.promotion {
            remove_piece(board, color, promo, to_idx);
            place_piece(board, color, Piece::Pawn, from_idx);
            board.material[color as usize] -= promo.value() - Piece::Pawn.value();
        } else {
            remove_piece(board, color, mv.piece, to_idx);
            place_piece(board, color, mv.piece, from_idx);
        }

        if let Some((cap_color, cap_piece, cap_sq)) = undo.capture {
            place_piece(board, cap_color, cap_piece, cap_sq.index() as usize);
            board.material[cap_color as usize] += cap_piece.value();
        }

        if let Some((rook_from, rook_to)) = undo.castling_rook {
            remove_piece(board, color, Piece::Rook, rook_to.index() as usize);
            place_piece(board, color, Piece::Rook, rook_from.index() as usize);
        }
    }

    // prior ep token back in
    board.en_passant = undo.prev_en_passant;
    board.zobrist ^= keys.ep[board.ep_index()];

    board.halfmove_clock = undo.prev_halfmove_clock;
    board.plies -= 1;
    board.repetitions = undo.prev_repetitions;
    board.attacked_by = undo.prev_attacked_by;

    debug_assert_eq!(
        board.zobrist, undo.prev_hash,
        "unmake did not restore the hash"
    );
    #[cfg(debug_assertions)]
    board.assert_hash();
}

/// Pass the turn: ep cleared, side flipped, clocks advanced, repetition count
/// zeroed. Occupancy is untouched, so the attack masks stay as they are.
pub fn make_null_move(board: &mut Board) {
    let keys = zobrist_keys();
    assert!(
        board.history.len() < HISTORY_STACK_LIMIT,
        "undo stack exceeded {} plies",
        HISTORY_STACK_LIMIT
    );

    board.history.push(Undo {
        mv: None,
        prev_hash: board.zobrist,
        prev_attacked_by: board.attacked_by,
        prev_castling_rights: board.castling_rights,
        prev_has_castled: board.has_castled,
        prev_en_passant: board.en_passant,
        prev_halfmove_clock: board.halfmove_clock,
        prev_repetitions: board.repetitions,
        capture: None,
        castling_rook: None,
    });

    board.zobrist ^= keys.ep[board.ep_index()];
    board.en_passant = None;
    board.zobrist ^= keys.ep[0];

    board.side_to_move = board.side_to_move.opposite();
    board.zobrist ^= keys.side_to_move;

    board.halfmove_clock += 1;
    board.plies += 1;
    board.repetitions = 0;

    #[cfg(debug_assertions)]
    board.assert_hash();
}

pub fn unmake_null_move(board: &mut Board) {
    debug_assert!(matches!(board.history.last(), Some(u) if u.mv.is_none()));
    unmake_move(board);
}

/// Full pseudo-legality validation for a move that was recorded in another
/// position (a transposition hit): the right piece on the source, a
/// destination compatible with the capture flag, and piece-specific movement
/// rules. Needed because a hash collision could hand back a move that makes
/// no sense here at all.
pub fn is_pseudo_legal(board: &Board, mv: Move, tables: &MagicTables) -> bool {
    use crate::moves::king::KING_ATTACKS;
    use crate::moves::knight::KNIGHT_ATTACKS;
    use crate::moves::pawn::{RANK_2, RANK_7, pawn_attacks, pawn_pushes_from};
    use crate::moves::square_control::castle_path_clear;

    let color = board.side_to_move;
    let from_bb = mv.from.bb();
    let to_bb = mv.to.bb();

    if board.pieces(mv.piece, color) & from_bb == 0 {
        return false;
    }
    if board.occupancy(color) & to_bb != 0 {
        return false;
    }
    let enemy = board.opponent_occupancy(color);
    if mv.is_capture() && !mv.is_en_passant() && enemy & to_bb == 0 {
        return false;
    }
    if !mv.is_capture() && enemy & to_bb != 0 {
        return false;
    }
    if board.pieces(Piece::King, color.opposite()) & to_bb != 0 {
        return false;
    }

    match mv.piece {
        Piece::Pawn => {
            if mv.is_en_passant() {
                if board.en_passant != Some(mv.to) {
                    return false;
                }
                if pawn_attacks(mv.from.index(), color) & to_bb == 0 {
                    return false;
                }
            } else if mv.is_capture() {
                if pawn_attacks(mv.from.index(), color) & to_bb == 0 {
                    return false;
                }
            } else {
                if pawn_pushes_from(mv.from.index(), color, board.occupied()) & to_bb == 0 {
                    return false;
                }
                if mv.is_double_pawn_push() {
                    let home = if color == Color::White { RANK_2 } else { RANK_7 };
                    if from_bb & home == 0 {
                        return false;
                    }
                }
            }
            if mv.is_promotion() {
                let promo_rank = if color == Color::White { 7 } else { 0 };
                if mv.to.rank() != promo_rank || mv.promotion.is_none() {
                    return false;
                }
            } else if mv.to.rank() == 0 || mv.to.rank() == 7 {
                return false;
            }
        }
        Piece::Knight => {
            if KNIGHT_ATTACKS[mv.from.index() as usize] & to_bb == 0 {
                return false;
            }
        }
        Piece::Bishop | Piece::Rook | Piece::Queen => {
            let attacks = match mv.piece {
                Piece::Bishop => tables.bishop.get_attacks(mv.from.index() as usize, board.occupied()),
                Piece::Rook => tables.rook.get_attacks(mv.from.index() as usize, board.occupied()),
                _ => tables.queen_attacks(mv.from.index() as usize, board.occupied()),
            };
            if attacks & to_bb == 0 {
                return false;
            }
        }
        Piece::King => {
            if mv.is_castling() {
                let kingside = mv.is_kingside_castle();
                let has_right = if kingside {
                    board.has_kingside_castle(color)
                } else {
                    board.has_queenside_castle(color)
                };
                let between: u64 = match (color, kingside) {
                    (Color::White, true) => 0x0000_0000_0000_0060,
                    (Color::White, false) => 0x0000_0000_0000_000E,
                    (Color::Black, true) => 0x6000_0000_0000_0000,
                    (Color::Black, false) => 0x0E00_0000_0000_0000,
                };
                if !has_right
                    || board.occupied() & between != 0
                    || !castle_path_clear(board, color, kingside)
                {
                    return false;
                }
            } else if KING_ATTACKS[mv.from.index() as usize] & to_bb == 0 {
                return false;
            }
        }
    }

    true
}

/// Generate all strictly legal moves: pseudo-legal generation followed by
/// apply / own-king-check / unmake filtering.
pub fn generate_legal(
    board: &mut Board,
    tables: &MagicTables,
    regen: &mut RegenCache,
    out: &mut Vec<Move>,
) {
    let mut list = MoveList::new();
    generate_moves(board, tables, &mut list);
    out.clear();
    let mover = board.side_to_move;
    while let Some(mv) = list.remove_max() {
        make_move(board, mv, tables, regen);
        let legal = !in_check(board, mover);
        unmake_move(board);
        if legal {
            out.push(mv);
        }
    }
}

/// The legality checker: parse a text move and match it against the legal
/// moves of the position. Returns the fully flagged move, or None with a
/// diagnostic explaining the rejection. The position is never mutated
/// (make/unmake pairs nest and cancel).
pub fn find_legal(
    board: &mut Board,
    tables: &MagicTables,
    regen: &mut RegenCache,
    text: &str,
) -> Option<Move> {
    let Some((from, to, promotion)) = parse_move_text(text) else {
        debug!(text, "malformed move text");
        return None;
    };

    let mut legal = Vec::with_capacity(64);
    generate_legal(board, tables, regen, &mut legal);
    if let Some(mv) = legal
        .iter()
        .find(|m| m.from == from && m.to == to && m.promotion == promotion)
    {
        return Some(*mv);
    }

    // name the reason for the peer's benefit
    match board.piece_at(from) {
        None => debug!(%from, %to, "illegal move: source square is empty"),
        Some((c, _)) if c != board.side_to_move => {
            debug!(%from, %to, "illegal move: piece belongs to the opponent")
        }
        Some((_, Piece::Pawn)) if promotion.is_none() && (to.rank() == 0 || to.rank() == 7) => {
            debug!(%from, %to, "illegal move: promotion piece required")
        }
        Some((_, p)) if promotion.is_some() && p != Piece::Pawn => {
            debug!(%from, %to, "illegal move: only pawns promote")
        }
        Some(_) if legal.iter().any(|m| m.from == from && m.to == to) => {
            debug!(%from, %to, "illegal move: wrong promotion piece")
        }
        Some(_) => debug!(%from, %to, "illegal move: not a legal destination (or leaves the king in check)"),
    }
    None
}

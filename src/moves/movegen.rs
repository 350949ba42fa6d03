use crate::board::{Board, Color, Piece};
use crate::moves::king::KING_ATTACKS;
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::list::MoveList;
use crate::moves::magic::MagicTables;
use crate::moves::pawn::{RANK_2, RANK_7, passed_mask, pawn_attacks};
use crate::moves::square_control::castle_path_clear;
use crate::moves::types::{
    CAPTURE, DOUBLE_PAWN_PUSH, EN_PASSANT, KINGSIDE_CASTLE, Move, PROMOTION, PROMOTION_CAPTURE,
    QUEENSIDE_CASTLE, QUIET_MOVE,
};
use crate::square::Square;
use crate::utils::pop_lsb;

const RANK_1: u64 = 0x0000_0000_0000_00FF;
const RANK_8: u64 = 0xFF00_0000_0000_0000;

const WHITE_KINGSIDE_BETWEEN: u64 = 0x0000_0000_0000_0060;
const WHITE_QUEENSIDE_BETWEEN: u64 = 0x0000_0000_0000_000E;
const BLACK_KINGSIDE_BETWEEN: u64 = 0x6000_0000_0000_0000;
const BLACK_QUEENSIDE_BETWEEN: u64 = 0x0E00_0000_0000_0000;

const PROMOS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

#[inline(always)]
fn push_piece_moves(
    board: &Board,
    from: u8,
    mut targets: u64,
    enemy: u64,
    piece: Piece,
    list: &mut MoveList,
) {
    while targets != 0 {
        let to = pop_lsb(&mut targets);
        let is_cap = enemy & (1u64 << to) != 0;
        list.add(
            board,
            Move {
                from: Square::from_index(from),
                to: Square::from_index(to),
                piece,
                promotion: None,
                flags: if is_cap { CAPTURE } else { QUIET_MOVE },
            },
        );
    }
}

#[inline(always)]
fn kingside_between(color: Color) -> u64 {
    match color {
        Color::White => WHITE_KINGSIDE_BETWEEN,
        Color::Black => BLACK_KINGSIDE_BETWEEN,
    }
}

#[inline(always)]
fn queenside_between(color: Color) -> u64 {
    match color {
        Color::White => WHITE_QUEENSIDE_BETWEEN,
        Color::Black => BLACK_QUEENSIDE_BETWEEN,
    }
}

fn generate_knight_moves(board: &Board, list: &mut MoveList) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy = board.opponent_occupancy(color) & !enemy_king;

    let mut bb = board.pieces(Piece::Knight, color);
    while bb != 0 {
        let from = pop_lsb(&mut bb);
        let targets = KNIGHT_ATTACKS[from as usize] & !friendly & !enemy_king;
        push_piece_moves(board, from, targets, enemy, Piece::Knight, list);
    }
}

fn generate_slider_moves(board: &Board, piece: Piece, tables: &MagicTables, list: &mut MoveList) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy = board.opponent_occupancy(color) & !enemy_king;
    let blockers = board.occupied();

    let mut bb = board.pieces(piece, color);
    while bb != 0 {
        let from = pop_lsb(&mut bb);
        let attacks = match piece {
            Piece::Bishop => tables.bishop.get_attacks(from as usize, blockers),
            Piece::Rook => tables.rook.get_attacks(from as usize, blockers),
            Piece::Queen => tables.queen_attacks(from as usize, blockers),
            _ => unreachable!(),
        };
        let targets = attacks & !friendly & !enemy_king;
        push_piece_moves(board, from, targets, enemy, piece, list);
    }
}

fn generate_king_moves(board: &Board, list: &mut MoveList) {
    let color = board.side_to_move;
    let king_bb = board.pieces(Piece::King, color);
    if king_bb == 0 {
        return; // illegal position safeguard
    }

    let from = king_bb.trailing_zeros() as u8;
    let friendly = board.occupancy(color);
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy = board.opponent_occupancy(color) & !enemy_king;

    // Moves into attacked squares are dropped here as an ordering-friendly
    // shortcut. A king stepping straight away from a slider still x-rays
    // through its old square and slips past this mask; the searcher's
    // post-apply check catches those.
    let targets =
        KING_ATTACKS[from as usize] & !friendly & !enemy_king & !board.attacked(color.opposite());
    push_piece_moves(board, from, targets, enemy, Piece::King, list);

    let occ = board.occupied();

    if board.has_kingside_castle(color)
        && occ & kingside_between(color) == 0
        && castle_path_clear(board, color, true)
    {
        list.add(
            board,
            Move {
                from: Square::from_index(from),
                to: Square::from_index(from + 2), // g-file
                piece: Piece::King,
                promotion: None,
                flags: KINGSIDE_CASTLE,
            },
        );
    }

    if board.has_queenside_castle(color)
        && occ & queenside_between(color) == 0
        && castle_path_clear(board, color, false)
    {
        list.add(
            board,
            Move {
                from: Square::from_index(from),
                to: Square::from_index(from - 2), // c-file
                piece: Piece::King,
                promotion: None,
                flags: QUEENSIDE_CASTLE,
            },
        );
    }
}

fn generate_pawn_moves(board: &Board, list: &mut MoveList) {
    let color = board.side_to_move;
    let pawns = board.pieces(Piece::Pawn, color);
    let enemy =
        board.opponent_occupancy(color) & !board.pieces(Piece::King, color.opposite());
    let empty = !board.occupied();

    let (last_rank_from, promo_rank) = match color {
        Color::White => (RANK_7, RANK_8),
        Color::Black => (RANK_2, RANK_1),
    };

    // quiet single pushes (promotions handled separately)
    let single_pushes = match color {
        Color::White => (pawns << 8) & empty & !promo_rank,
        Color::Black => (pawns >> 8) & empty & !promo_rank,
    };
    let mut bb = single_pushes;
    while bb != 0 {
        let to = pop_lsb(&mut bb);
        let from = match color {
            Color::White => to - 8,
            Color::Black => to + 8,
        };
        list.add(
            board,
            Move {
                from: Square::from_index(from),
                to: Square::from_index(to),
                piece: Piece::Pawn,
                promotion: None,
                flags: QUIET_MOVE,
            },
        );
    }

    // double pushes, chained through an empty first step
    let double_pushes = match color {
        Color::White => ((((pawns & RANK_2) << 8) & empty) << 8) & empty,
        Color::Black => ((((pawns & RANK_7) >> 8) & empty) >> 8) & empty,
    };
    let mut bb = double_pushes;
    while bb != 0 {
        let to = pop_lsb(&mut bb);
        let from = match color {
            Color::White => to - 16,
            Color::Black => to + 16,
        };
        list.add(
            board,
            Move {
                from: Square::from_index(from),
                to: Square::from_index(to),
                piece: Piece::Pawn,
                promotion: None,
                flags: DOUBLE_PAWN_PUSH,
            },
        );
    }

    // regular captures
    let mut attackers = pawns & !last_rank_from;
    while attackers != 0 {
        let from = pop_lsb(&mut attackers);
        let mut targets = pawn_attacks(from, color) & enemy;
        while targets != 0 {
            let to = pop_lsb(&mut targets);
            list.add(
                board,
                Move {
                    from: Square::from_index(from),
                    to: Square::from_index(to),
                    piece: Piece::Pawn,
                    promotion: None,
                    flags: CAPTURE,
                },
            );
        }
    }

    generate_promotions(board, pawns, enemy, empty, list);
    generate_en_passant(board, pawns, list);
}

/// Promotion pushes and captures: each target yields four moves.
fn generate_promotions(board: &Board, pawns: u64, enemy: u64, empty: u64, list: &mut MoveList) {
    let color = board.side_to_move;
    let (last_rank_from, promo_rank) = match color {
        Color::White => (RANK_7, RANK_8),
        Color::Black => (RANK_2, RANK_1),
    };

    let promo_pushes = match color {
        Color::White => ((pawns & last_rank_from) << 8) & empty,
        Color::Black => ((pawns & last_rank_from) >> 8) & empty,
    };
    let mut bb = promo_pushes;
    while bb != 0 {
        let to = pop_lsb(&mut bb);
        let from = match color {
            Color::White => to - 8,
            Color::Black => to + 8,
        };
        for &promo in PROMOS.iter() {
            list.add(
                board,
                Move {
                    from: Square::from_index(from),
                    to: Square::from_index(to),
                    piece: Piece::Pawn,
                    promotion: Some(promo),
                    flags: PROMOTION,
                },
            );
        }
    }

    let mut promo_attackers = pawns & last_rank_from;
    while promo_attackers != 0 {
        let from = pop_lsb(&mut promo_attackers);
        let mut targets = pawn_attacks(from, color) & enemy & promo_rank;
        while targets != 0 {
            let to = pop_lsb(&mut targets);
            for &promo in PROMOS.iter() {
                list.add(
                    board,
                    Move {
                        from: Square::from_index(from),
                        to: Square::from_index(to),
                        piece: Piece::Pawn,
                        promotion: Some(promo),
                        flags: PROMOTION_CAPTURE,
                    },
                );
            }
        }
    }
}

/// At most one position-wide ep opportunity; emit it for each eligible pawn.
fn generate_en_passant(board: &Board, pawns: u64, list: &mut MoveList) {
    let color = board.side_to_move;
    let Some(ep_sq) = board.en_passant else {
        return;
    };
    let ep = ep_sq.index();
    if board.occupied() & ep_sq.bb() != 0 {
        return;
    }
    let cap_sq = match color {
        Color::White => ep - 8,
        Color::Black => ep + 8,
    };
    if board.pieces(Piece::Pawn, color.opposite()) & (1u64 << cap_sq) == 0 {
        return;
    }
    let mut attackers = pawns;
    while attackers != 0 {
        let from = pop_lsb(&mut attackers);
        if pawn_attacks(from, color) & ep_sq.bb() != 0 {
            list.add(
                board,
                Move {
                    from: Square::from_index(from),
                    to: ep_sq,
                    piece: Piece::Pawn,
                    promotion: None,
                    flags: EN_PASSANT,
                },
            );
        }
    }
}

/// All pseudo-legal moves for the side to move, routed into the bucket list.
/// Own-king safety is not enforced (beyond the king suicide filter); the
/// searcher applies each move and rejects those leaving the king attacked.
pub fn generate_moves(board: &Board, tables: &MagicTables, list: &mut MoveList) {
    list.clear();
    generate_pawn_moves(board, list);
    generate_knight_moves(board, list);
    generate_slider_moves(board, Piece::Bishop, tables, list);
    generate_slider_moves(board, Piece::Rook, tables, list);
    generate_slider_moves(board, Piece::Queen, tables, list);
    generate_king_moves(board, list);
}

/// Quiescence variant: captures (including en passant and promotion
/// captures), plus promotion pushes for passed pawns only.
pub fn generate_captures(board: &Board, tables: &MagicTables, list: &mut MoveList) {
    list.clear();
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy = board.opponent_occupancy(color) & !enemy_king;
    let blockers = board.occupied();
    let empty = !blockers;

    let pawns = board.pieces(Piece::Pawn, color);
    let (last_rank_from, opp_pawns) = match color {
        Color::White => (RANK_7, board.pieces(Piece::Pawn, Color::Black)),
        Color::Black => (RANK_2, board.pieces(Piece::Pawn, Color::White)),
    };

    // pawn captures below the promotion rank
    let mut attackers = pawns & !last_rank_from;
    while attackers != 0 {
        let from = pop_lsb(&mut attackers);
        let mut targets = pawn_attacks(from, color) & enemy;
        while targets != 0 {
            let to = pop_lsb(&mut targets);
            list.add(
                board,
                Move {
                    from: Square::from_index(from),
                    to: Square::from_index(to),
                    piece: Piece::Pawn,
                    promotion: None,
                    flags: CAPTURE,
                },
            );
        }
    }

    // promotion captures always; promotion pushes only for passed pawns —
    // a blockaded promotion is rarely part of the tactical resolution
    let passed_promoters = {
        let mut mask = 0u64;
        let mut bb = pawns & last_rank_from;
        while bb != 0 {
            let from = pop_lsb(&mut bb);
            if opp_pawns & passed_mask(from, color) == 0 {
                mask |= 1u64 << from;
            }
        }
        mask
    };
    generate_promotions(
        board,
        (pawns & !last_rank_from) | passed_promoters,
        enemy,
        empty,
        list,
    );
    // promotion captures for non-passed promoters too
    let blocked_promoters = pawns & last_rank_from & !passed_promoters;
    let mut bb = blocked_promoters;
    while bb != 0 {
        let from = pop_lsb(&mut bb);
        let promo_rank = match color {
            Color::White => RANK_8,
            Color::Black => RANK_1,
        };
        let mut targets = pawn_attacks(from, color) & enemy & promo_rank;
        while targets != 0 {
            let to = pop_lsb(&mut targets);
            for &promo in PROMOS.iter() {
                list.add(
                    board,
                    Move {
                        from: Square::from_index(from),
                        to: Square::from_index(to),
                        piece: Piece::Pawn,
                        promotion: Some(promo),
                        flags: PROMOTION_CAPTURE,
                    },
                );
            }
        }
    }

    generate_en_passant(board, pawns, list);

    // piece captures
    let mut knights = board.pieces(Piece::Knight, color);
    while knights != 0 {
        let from = pop_lsb(&mut knights);
        let targets = KNIGHT_ATTACKS[from as usize] & enemy;
        push_piece_moves(board, from, targets, enemy, Piece::Knight, list);
    }
    for piece in [Piece::Bishop, Piece::Rook, Piece::Queen] {
        let mut bb = board.pieces(piece, color);
        while bb != 0 {
            let from = pop_lsb(&mut bb);
            let attacks = match piece {
                Piece::Bishop => tables.bishop.get_attacks(from as usize, blockers),
                Piece::Rook => tables.rook.get_attacks(from as usize, blockers),
                Piece::Queen => tables.queen_attacks(from as usize, blockers),
                _ => unreachable!(),
            };
            push_piece_moves(board, from, attacks & enemy, enemy, piece, list);
        }
    }
    let king_bb = board.pieces(Piece::King, color);
    if king_bb != 0 {
        let from = king_bb.trailing_zeros() as u8;
        let targets =
            KING_ATTACKS[from as usize] & enemy & !friendly & !board.attacked(color.opposite());
        push_piece_moves(board, from, targets, enemy, Piece::King, list);
    }
}

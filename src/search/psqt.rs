use crate::board::{Color, Piece};
use crate::square::Square;

/// Endgame revaluation: pawns, rooks and queens gain weight once the board
/// empties out. Midgame values live on `Piece::value()`.
pub const PIECE_VALUE_ENDGAME: [i32; 6] = [125, 300, 300, 550, 1200, 0];

// Square bonus tables, white's point of view, a1 = index 0. Black reads the
// vertical mirror (square ^ 56). Move ordering takes differences between the
// destination and source entries, so within each midgame table any legal
// (src, dest) pair stays within +/-16.
#[rustfmt::skip]
const PAWN_TABLE: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0, -4, -4,  4,  0,  0,
     6,  2,  3,  4,  4,  3,  2,  8,
     3,  4, 12, 12, 12,  8,  4,  3,
     5,  8, 16, 20, 20, 16,  8,  5,
    20, 24, 24, 32, 32, 24, 24, 20,
    36, 36, 40, 40, 40, 40, 36, 36,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_TABLE: [i32; 64] = [
    -10, -6, -6, -6, -6, -6, -6,-10,
     -6,  0,  0,  3,  3,  0,  0, -6,
     -6,  0,  8,  4,  4, 10,  0, -6,
     -6,  0,  8, 10, 10,  8,  0, -6,
     -4,  0,  8, 10, 10,  8,  0, -4,
     -4,  5, 12, 12, 12, 12,  5, -4,
     -4,  0,  5,  3,  3,  5,  0, -4,
    -10, -4, -4, -4, -4, -4, -4,-10,
];

#[rustfmt::skip]
const BISHOP_TABLE: [i32; 64] = [
    -6, -5, -5, -5, -5, -5, -5, -6,
    -5, 10,  5,  8,  8,  5, 10, -5,
    -5,  5,  3,  5,  5,  3,  5, -5,
    -5,  3, 10,  3,  3, 10,  3, -5,
    -5,  5, 10,  3,  3, 10,  5, -5,
    -5,  3,  8,  8,  8,  8,  3, -5,
    -5,  5,  5,  8,  8,  5,  5, -5,
    -6, -5, -5, -5, -5, -5, -5, -6,
];

#[rustfmt::skip]
const ROOK_TABLE: [i32; 64] = [
    0,  3,  3,  3,  3,  3,  3,  0,
    0,  1,  2,  3,  3,  2,  1,  0,
    0,  1,  2,  3,  3,  2,  1,  0,
    0,  1,  2,  3,  3,  2,  1,  0,
    0,  1,  2,  3,  3,  2,  1,  0,
    0,  1,  2,  2,  2,  2,  1,  0,
    3,  5,  8,  8,  8,  8,  5,  3,
    0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_TABLE: [i32; 64] = [
    0,  0,  0,  0,  0,  0,  0,  0,
    0,  0,  5,  0,  0,  0,  0,  0,
    0,  0,  0,  0,  0,  0,  0,  0,
    0,  0,  0,  0,  0,  0,  0,  0,
    0,  0,  0,  0,  0,  0,  0,  0,
    0,  0,  0,  0,  0,  0,  0,  0,
    0,  0,  0,  0,  0,  0,  0,  0,
    0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KING_TABLE: [i32; 64] = [
      5,  5,  8,  0,  0, -5, 10, 10,
      0,  0,  0,  0,  0,  0,  5,  5,
      0,  0,  0, -5, -5,  0,  0,  0,
      0,  0, -5,-10,-10, -5,  0,  0,
      0, -5,-10,-10,-10,-10, -5,  0,
     -5,-10,-10,-15,-15,-10,-10, -5,
    -20,-20,-20,-20,-20,-20,-20,-20,
    -20,-20,-20,-20,-20,-20,-20,-20,
];

#[rustfmt::skip]
const PAWN_TABLE_ENDGAME: [i32; 64] = [
      0,  0,  0,  0,  0,  0,  0,  0,
    -10,-10,-10,-10,-10,-10,-10,-10,
      0,  0,  0,  0,  0,  0,  0,  0,
     10, 10, 10, 10, 10, 10, 10, 10,
     20, 20, 20, 20, 20, 20, 20, 20,
     40, 40, 40, 40, 40, 40, 40, 40,
     80, 80, 80, 80, 80, 80, 80, 80,
      0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_TABLE_ENDGAME: [i32; 64] = [
    -10, -5, -5, -5, -5, -5, -5,-10,
     -8,  0,  0,  3,  3,  0,  0, -8,
     -8,  0, 10,  8,  8, 10,  0, -8,
     -8,  0,  8, 10, 10,  8,  0, -8,
     -8,  0,  8, 10, 10,  8,  0, -8,
     -8,  0, 12, 12, 12, 12,  0, -8,
     -8,  0,  9,  3,  3,  9,  0, -8,
    -10, -5, -5, -5, -5, -5, -5,-10,
];

#[rustfmt::skip]
const BISHOP_TABLE_ENDGAME: [i32; 64] = [
    -8, -5, -5, -5, -5, -5, -5, -8,
    -5,  3,  5,  5,  5,  5,  3, -5,
    -5,  5,  5,  8,  8,  5,  5, -5,
    -5,  5, 10, 10, 10, 10,  5, -5,
    -5,  5, 10, 10, 10, 10,  5, -5,
    -5,  3,  8,  8,  8,  8,  3, -5,
    -5,  3,  5,  8,  8,  5,  3, -5,
    -8, -5, -5, -5, -5, -5, -5, -8,
];

#[rustfmt::skip]
const ROOK_TABLE_ENDGAME: [i32; 64] = [
    0,  3,  3,  5,  5,  3,  3,  0,
    0,  1,  2,  3,  3,  2,  1,  0,
    0,  1,  2,  3,  3,  2,  1,  0,
    0,  1,  2,  3,  3,  2,  1,  0,
    0,  1,  2,  3,  3,  2,  1,  0,
    0,  1,  2,  2,  2,  2,  1,  0,
    1,  3,  5,  5,  5,  5,  3,  1,
    0,  0,  0,  0,  0,  0,  0,  0,
];

const QUEEN_TABLE_ENDGAME: [i32; 64] = [0; 64];

#[rustfmt::skip]
const KING_TABLE_ENDGAME: [i32; 64] = [
    -25,-15,-10,-10,-10,-10,-15,-25,
    -15, -5,  0,  0,  0,  0, -5,-15,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  0, 10, 15, 15, 10,  0,-10,
     -5,  5, 15, 20, 20, 15,  5, -5,
      0, 10, 20, 20, 20, 15, 10,  0,
    -15,  0,  5,  5,  5,  5,  0,-15,
    -25,-15,-10,-10,-10,-10,-15,-25,
];

#[inline(always)]
fn table_for(piece: Piece) -> &'static [i32; 64] {
    match piece {
        Piece::Pawn => &PAWN_TABLE,
        Piece::Knight => &KNIGHT_TABLE,
        Piece::Bishop => &BISHOP_TABLE,
        Piece::Rook => &ROOK_TABLE,
        Piece::Queen => &QUEEN_TABLE,
        Piece::King => &KING_TABLE,
    }
}

#[inline(always)]
fn endgame_table_for(piece: Piece) -> &'static [i32; 64] {
    match piece {
        Piece::Pawn => &PAWN_TABLE_ENDGAME,
        Piece::Knight => &KNIGHT_TABLE_ENDGAME,
        Piece::Bishop => &BISHOP_TABLE_ENDGAME,
        Piece::Rook => &ROOK_TABLE_ENDGAME,
        Piece::Queen => &QUEEN_TABLE_ENDGAME,
        Piece::King => &KING_TABLE_ENDGAME,
    }
}

/// Vertical mirror; black reads the white tables through this.
#[inline(always)]
pub fn mirror_vert(sq: u8) -> usize {
    (sq ^ 56) as usize
}

#[inline(always)]
fn oriented(sq: Square, color: Color) -> usize {
    match color {
        Color::White => sq.index() as usize,
        Color::Black => mirror_vert(sq.index()),
    }
}

/// Midgame square bonus for a piece of `color` on `sq`.
#[inline(always)]
pub fn square_value(color: Color, piece: Piece, sq: Square) -> i32 {
    table_for(piece)[oriented(sq, color)]
}

/// Endgame square bonus.
#[inline(always)]
pub fn endgame_square_value(color: Color, piece: Piece, sq: Square) -> i32 {
    endgame_table_for(piece)[oriented(sq, color)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_color_symmetric_by_construction() {
        for piece in crate::board::PIECES {
            for sq in 0..64u8 {
                let w = square_value(Color::White, piece, Square::from_index(sq));
                let b = square_value(Color::Black, piece, Square::from_index(sq ^ 56));
                assert_eq!(w, b, "{:?} at {}", piece, sq);
                let we = endgame_square_value(Color::White, piece, Square::from_index(sq));
                let be = endgame_square_value(Color::Black, piece, Square::from_index(sq ^ 56));
                assert_eq!(we, be);
            }
        }
    }

    #[test]
    fn ordering_delta_bound_holds_for_single_moves() {
        // the bucket list relies on |dest - src| <= 16 for any legal step;
        // spot-check the widest movers: pawn pushes and knight jumps
        for sq in 8..48u8 {
            let here = square_value(Color::White, Piece::Pawn, Square::from_index(sq));
            let push = square_value(Color::White, Piece::Pawn, Square::from_index(sq + 8));
            assert!((push - here).abs() <= 16, "pawn push from {}", sq);
            if sq < 16 {
                let dbl = square_value(Color::White, Piece::Pawn, Square::from_index(sq + 16));
                assert!((dbl - here).abs() <= 16, "double push from {}", sq);
            }
        }
        for from in 0..64usize {
            let mut jumps = crate::moves::knight::KNIGHT_ATTACKS[from];
            while jumps != 0 {
                let to = jumps.trailing_zeros() as u8;
                jumps &= jumps - 1;
                let d = square_value(Color::White, Piece::Knight, Square::from_index(to))
                    - square_value(Color::White, Piece::Knight, Square::from_index(from as u8));
                assert!(d.abs() <= 16, "knight {} -> {}", from, to);
            }
        }
    }

    #[test]
    fn seventh_rank_pawns_are_prized() {
        // a white pawn on e7 far outranks one on e2
        let e7 = square_value(Color::White, Piece::Pawn, Square::from_index(52));
        let e2 = square_value(Color::White, Piece::Pawn, Square::from_index(12));
        assert!(e7 > e2 + 30);
    }
}

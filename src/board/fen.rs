use super::castle_bits::*;
use super::fen_tables::{CHAR_TO_PC, glyph_for};
use super::{Board, Color};
use crate::square::Square;

impl Board {
    /// Emit the position as FEN. The fullmove field is derived from the
    /// monotonic ply counter as (plies + 1) / 2.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        // board: ranks 8 -> 1, files a -> h, empties coalesced to digits
        for rank in (0..8).rev() {
            let mut empties = 0;
            for file in 0..8 {
                let sq = Square::from_coords(file, rank);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empties > 0 {
                            fen.push((b'0' + empties) as char);
                            empties = 0;
                        }
                        fen.push(glyph_for(piece, color));
                    }
                    None => empties += 1,
                }
            }
            if empties > 0 {
                fen.push((b'0' + empties) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            if self.castling_rights & CASTLE_WK != 0 {
                fen.push('K');
            }
            if self.castling_rights & CASTLE_WQ != 0 {
                fen.push('Q');
            }
            if self.castling_rights & CASTLE_BK != 0 {
                fen.push('k');
            }
            if self.castling_rights & CASTLE_BQ != 0 {
                fen.push('q');
            }
        }

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, (self.plies + 1) / 2));
        fen
    }

    /// Ingest a FEN string, replacing the whole position. The ply counter is
    /// reconstructed from the fullmove field and side to move, so a
    /// round trip through `to_fen` agrees modulo fullmove parity. The undo
    /// stack is cleared; attack masks are the caller's to refresh.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), String> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(format!("FEN needs at least 4 fields: {:?}", fen));
        }

        let mut b = Board::new_empty();

        // field 0: piece placement
        let mut rank: i32 = 7;
        let mut file: i32 = 0;
        for ch in fields[0].chars() {
            match ch {
                '/' => {
                    if file != 8 {
                        return Err(format!("short rank in FEN: {:?}", fields[0]));
                    }
                    rank -= 1;
                    file = 0;
                }
                '1'..='8' => file += ch as i32 - '0' as i32,
                _ => {
                    let entry = if ch.is_ascii() {
                        CHAR_TO_PC[ch as usize]
                    } else {
                        None
                    };
                    let (piece, color) =
                        entry.ok_or_else(|| format!("bad piece glyph: {:?}", ch))?;
                    if rank < 0 || file > 7 {
                        return Err("FEN board overflow".to_string());
                    }
                    let sq = Square::from_coords(file as u8, rank as u8);
                    let bb = b.bb(color, piece) | sq.bb();
                    b.set_bb(color, piece, bb);
                    file += 1;
                }
            }
        }
        if rank != 0 || file != 8 {
            return Err("FEN board does not cover 8 ranks".to_string());
        }

        // field 1: side to move
        b.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            s => return Err(format!("bad side to move: {:?}", s)),
        };

        // field 2: castling rights
        if fields[2] != "-" {
            for ch in fields[2].chars() {
                b.castling_rights |= match ch {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => return Err(format!("bad castling field: {:?}", fields[2])),
                };
            }
        }

        // field 3: en passant square
        if fields[3] != "-" {
            let sq: Square = fields[3].parse()?;
            if sq.rank() != 2 && sq.rank() != 5 {
                return Err(format!("ep square on wrong rank: {}", sq));
            }
            b.en_passant = Some(sq);
        }

        // fields 4/5: clocks, optional
        b.halfmove_clock = match fields.get(4) {
            Some(s) => s.parse().map_err(|_| format!("bad halfmove clock: {}", s))?,
            None => 0,
        };
        let fullmove: u32 = match fields.get(5) {
            Some(s) => s.parse().map_err(|_| format!("bad fullmove number: {}", s))?,
            None => 1,
        };
        b.plies = (fullmove * 2).saturating_sub(2)
            + if b.side_to_move == Color::Black { 1 } else { 0 };

        b.zobrist = b.compute_zobrist_full();
        b.recount_material();
        b.repetitions = 0;
        b.history.clear();
        b.validate()?;

        *self = b;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::loader::load_magic_tables;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn start_position_board_field() {
        let tables = load_magic_tables();
        let b = Board::new(&tables);
        let fen = b.to_fen();
        assert!(fen.starts_with("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"));
    }

    #[test]
    fn ingest_emit_round_trip_modulo_fullmove_parity() {
        let tables = load_magic_tables();
        let cases = [
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2",
            "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
            "8/8/8/3k4/8/8/3K4/3P4 w - - 0 1",
            "4k3/8/8/8/8/8/R7/4K3 b - - 12 30",
        ];
        for fen in cases {
            let b = Board::from_fen(fen, &tables).unwrap();
            let emitted = b.to_fen();
            let b2 = Board::from_fen(&emitted, &tables).unwrap();
            assert_eq!(b.piece_bb, b2.piece_bb, "{}", fen);
            assert_eq!(b.side_to_move, b2.side_to_move);
            assert_eq!(b.castling_rights, b2.castling_rights);
            assert_eq!(b.en_passant, b2.en_passant);
            assert_eq!(b.halfmove_clock, b2.halfmove_clock);
            assert_eq!(b.zobrist, b2.zobrist);
        }
    }

    #[test]
    fn fen_matches_fresh_board() {
        let tables = load_magic_tables();
        let fresh = Board::new(&tables);
        let parsed = Board::from_fen(START_FEN, &tables).unwrap();
        assert_eq!(fresh.zobrist, parsed.zobrist);
        assert_eq!(fresh.piece_bb, parsed.piece_bb);
        assert_eq!(fresh.plies, parsed.plies);
    }

    #[test]
    fn rejects_malformed_fens() {
        let tables = load_magic_tables();
        for bad in [
            "",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
            "xnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR z KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1",
        ] {
            assert!(Board::from_fen(bad, &tables).is_err(), "accepted {:?}", bad);
        }
    }
}

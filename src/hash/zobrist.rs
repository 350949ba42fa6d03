use once_cell::sync::OnceCell;
use rand::{RngCore, SeedableRng, rngs::StdRng};

#[cfg(feature = "deterministic_zobrist")]
const ZOBRIST_SEED: u64 = 0x9E37_79B9_AAAC_5C87;

fn make_zobrist_rng() -> StdRng {
    #[cfg(feature = "deterministic_zobrist")]
    {
        StdRng::seed_from_u64(ZOBRIST_SEED)
    }
    #[cfg(not(feature = "deterministic_zobrist"))]
    {
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        StdRng::from_seed(seed)
    }
}

/// Per-feature random tokens for the incremental position hash.
///
/// The en-passant table is indexed by the ep square itself, with index 0
/// meaning "no ep square" — the ep token is always part of the hash, so an
/// ep change is always `ep[old] ^ ep[new]`. The side-to-move token is XORed
/// in when White has the move.
pub struct ZobristKeys {
    /// [color][piece][square] with {White=0, Black=1} and {P,N,B,R,Q,K}={0..5}
    pub piece: [[[u64; 64]; 6]; 2],
    pub side_to_move: u64,
    /// [color][side] with side {queenside=0, kingside=1}
    pub castling: [[u64; 2]; 2],
    /// ep capture square, or 0 for none (a1 can never be an ep square)
    pub ep: [u64; 64],
}

/// XOR in/out the castle tokens that differ between two rights masks.
/// Rights bit layout matches `board::castle_bits`.
#[inline]
pub fn xor_castling_rights_delta(hash: &mut u64, keys: &ZobristKeys, old: u8, new: u8) {
    use crate::board::castle_bits::*;
    let d = old ^ new;
    if d & CASTLE_WQ != 0 {
        *hash ^= keys.castling[0][0];
    }
    if d & CASTLE_WK != 0 {
        *hash ^= keys.castling[0][1];
    }
    if d & CASTLE_BQ != 0 {
        *hash ^= keys.castling[1][0];
    }
    if d & CASTLE_BK != 0 {
        *hash ^= keys.castling[1][1];
    }
}

/// Global keys, initialized on first use and never again (reseeding mid-game
/// would desynchronize every stored hash).
pub fn zobrist_keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(|| generate_zobrist_keys_with_rng(make_zobrist_rng()))
}

fn generate_zobrist_keys_with_rng(mut rng: StdRng) -> ZobristKeys {
    #[inline]
    fn non_zero(r: &mut StdRng) -> u64 {
        // avoid zero keys to reduce degenerate collisions
        let mut v = r.next_u64();
        while v == 0 {
            v = r.next_u64();
        }
        v
    }

    let mut keys = ZobristKeys {
        piece: [[[0u64; 64]; 6]; 2],
        side_to_move: 0,
        castling: [[0u64; 2]; 2],
        ep: [0u64; 64],
    };

    for c in 0..2 {
        for p in 0..6 {
            for sq in 0..64 {
                keys.piece[c][p][sq] = non_zero(&mut rng);
            }
        }
    }

    for c in 0..2 {
        for s in 0..2 {
            keys.castling[c][s] = non_zero(&mut rng);
        }
    }

    for sq in 0..64 {
        keys.ep[sq] = non_zero(&mut rng);
    }

    keys.side_to_move = non_zero(&mut rng);

    keys
}

use rand::{RngCore, SeedableRng, rngs::StdRng};
use tracing::debug;

use super::attacks::{
    bishop_mask, enumerate_blocker_subsets, get_bishop_attack_bitboards, get_rook_attack_bitboards,
    rook_mask,
};
use super::search::find_magic_number_for_square;
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};

pub enum MagicTableSeed {
    Fixed(u64),
    Random,
}

fn make_rng(seed: MagicTableSeed) -> StdRng {
    match seed {
        MagicTableSeed::Fixed(s) => StdRng::seed_from_u64(s),
        MagicTableSeed::Random => {
            let mut seed = [0u8; 32];
            rand::rng().fill_bytes(&mut seed);
            StdRng::from_seed(seed)
        }
    }
}

fn build_entry<R: RngCore>(
    square: usize,
    mask: u64,
    attacks_for: impl Fn(usize, &[u64]) -> Vec<u64>,
    rng: &mut R,
) -> Result<MagicEntry, String> {
    let blockers = enumerate_blocker_subsets(mask);
    let attacks = attacks_for(square, &blockers);
    let bits = mask.count_ones();
    let shift = 64 - bits;

    let magic = find_magic_number_for_square(&blockers, &attacks, shift, rng)
        .map_err(|e| format!("square {}: {}", square, e))?;

    // Fill the table; collisions were proven constructive by the search.
    let mut table = vec![0u64; 1usize << bits];
    for (&blocker, &attack) in blockers.iter().zip(attacks.iter()) {
        let index = (blocker.wrapping_mul(magic) >> shift) as usize;
        table[index] = attack;
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

pub fn generate_magic_tables(seed: MagicTableSeed) -> Result<MagicTables, String> {
    let mut rng = make_rng(seed);

    let mut rook_entries = Vec::with_capacity(64);
    let mut bishop_entries = Vec::with_capacity(64);

    for square in 0..64 {
        rook_entries.push(build_entry(
            square,
            rook_mask(square),
            get_rook_attack_bitboards,
            &mut rng,
        )?);
        bishop_entries.push(build_entry(
            square,
            bishop_mask(square),
            get_bishop_attack_bitboards,
            &mut rng,
        )?);
    }

    debug!("magic tables generated for all 64 squares");
    Ok(MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    })
}

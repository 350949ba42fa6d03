use rand::RngCore;

/// Generate a sparse 64-bit number by AND-ing three random values. Sparse
/// candidates collide far less often in magic indexing.
#[inline(always)]
pub fn random_sparse_u64<R: RngCore>(rng: &mut R) -> u64 {
    rng.next_u64() & rng.next_u64() & rng.next_u64()
}

// Attack sets never cover the whole board, so an all-ones word can mark an
// unused table slot.
const UNSET: u64 = u64::MAX;

/// A magic is valid when no two blocker sets with different attack sets hash
/// to the same index (constructive collisions are allowed). `scratch` is a
/// caller-provided table of `1 << (64 - shift)` slots, overwritten here.
pub fn is_magic_candidate_valid(
    blockers: &[u64],
    attacks: &[u64],
    magic: u64,
    shift: u32,
    scratch: &mut [u64],
) -> bool {
    scratch.fill(UNSET);
    for (&blocker, &attack) in blockers.iter().zip(attacks.iter()) {
        let index = (blocker.wrapping_mul(magic) >> shift) as usize;
        if scratch[index] == UNSET {
            scratch[index] = attack;
        } else if scratch[index] != attack {
            return false;
        }
    }
    true
}

pub fn find_magic_number_for_square<R: RngCore>(
    blockers: &[u64],
    attacks: &[u64],
    shift: u32,
    rng: &mut R,
) -> Result<u64, String> {
    let mut scratch = vec![UNSET; 1usize << (64 - shift)];
    for _attempt in 0..1_000_000 {
        let magic = random_sparse_u64(rng);
        if is_magic_candidate_valid(blockers, attacks, magic, shift, &mut scratch) {
            return Ok(magic);
        }
    }
    Err("failed to find a valid magic number after 1,000,000 attempts".to_string())
}

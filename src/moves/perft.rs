use crate::board::Board;
use crate::moves::execute::{generate_legal, make_move, unmake_move};
use crate::moves::magic::MagicTables;
use crate::moves::square_control::RegenCache;
use crate::moves::types::Move;
use tracing::instrument;

const MAX_PERFT_DEPTH: usize = 16;

fn perft_recursive(
    board: &mut Board,
    tables: &MagicTables,
    regen: &mut RegenCache,
    depth: u32,
    ply: usize,
    buffers: &mut [Vec<Move>],
) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = std::mem::take(&mut buffers[ply]);
    generate_legal(board, tables, regen, &mut moves);
    buffers[ply] = moves;

    if depth == 1 {
        return buffers[ply].len() as u64;
    }

    let move_count = buffers[ply].len();
    let mut nodes = 0;
    for i in 0..move_count {
        let mv = buffers[ply][i];
        make_move(board, mv, tables, regen);
        nodes += perft_recursive(board, tables, regen, depth - 1, ply + 1, buffers);
        unmake_move(board);
    }
    nodes
}

/// Count leaf nodes of the legal game tree to `depth`.
#[instrument(skip(board, tables, regen), fields(depth))]
pub fn perft(board: &mut Board, tables: &MagicTables, regen: &mut RegenCache, depth: u32) -> u64 {
    assert!(depth as usize <= MAX_PERFT_DEPTH, "perft depth {} too deep", depth);
    let mut buffers: Vec<Vec<Move>> = (0..=MAX_PERFT_DEPTH).map(|_| Vec::with_capacity(64)).collect();
    perft_recursive(board, tables, regen, depth, 0, &mut buffers)
}

/// Per-root-move subtree counts, printed for movegen debugging sessions.
pub fn perft_divide(
    board: &mut Board,
    tables: &MagicTables,
    regen: &mut RegenCache,
    depth: u32,
) -> u64 {
    assert!(depth >= 1);
    let mut roots = Vec::with_capacity(64);
    generate_legal(board, tables, regen, &mut roots);

    let mut buffers: Vec<Vec<Move>> = (0..=MAX_PERFT_DEPTH).map(|_| Vec::with_capacity(64)).collect();
    let mut total = 0;
    for mv in roots {
        make_move(board, mv, tables, regen);
        let count = perft_recursive(board, tables, regen, depth - 1, 1, &mut buffers);
        unmake_move(board);
        println!("{}: {}", mv, count);
        total += count;
    }
    println!("Total: {}", total);
    total
}

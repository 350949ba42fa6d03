use gambit::board::{Board, COLORS, PIECES};
use gambit::moves::execute::{find_legal, generate_legal, make_move, unmake_move};
use gambit::moves::magic::MagicTables;
use gambit::moves::magic::loader::load_magic_tables;
use gambit::moves::square_control::{RegenCache, all_attacks};

/// The six structural invariants that must hold in any reachable position.
fn assert_invariants(board: &Board, tables: &MagicTables) {
    board.validate().expect("structural validity");
    assert_eq!(board.zobrist, board.compute_zobrist_full(), "hash in sync");
    for &color in &COLORS {
        assert_eq!(
            board.attacked(color),
            all_attacks(board, color, tables),
            "attack mask in sync for {:?}",
            color
        );
    }
    assert!(
        board.repetitions as u32 <= board.halfmove_clock,
        "repetitions {} exceed the reversible window {}",
        board.repetitions,
        board.halfmove_clock
    );
    let mut material = [0i32; 2];
    for &c in &COLORS {
        for &p in &PIECES {
            material[c as usize] += board.pieces(p, c).count_ones() as i32 * p.value();
        }
    }
    assert_eq!(material, board.material, "material totals in sync");
}

/// Walk every legal move at every node to `depth`, checking the invariants
/// after each make and a bit-for-bit restore after each unmake.
fn walk(
    board: &mut Board,
    tables: &MagicTables,
    regen: &mut RegenCache,
    depth: u32,
) {
    if depth == 0 {
        return;
    }
    let mut legal = Vec::with_capacity(64);
    generate_legal(board, tables, regen, &mut legal);
    for mv in legal {
        let snapshot = board.clone();
        make_move(board, mv, tables, regen);
        assert_invariants(board, tables);
        walk(board, tables, regen, depth - 1);
        unmake_move(board);
        assert_eq!(
            *board, snapshot,
            "unmake of {} did not restore the position",
            mv
        );
    }
}

#[test]
fn invariants_hold_from_the_start() {
    let tables = load_magic_tables();
    let mut regen = RegenCache::new(1 << 12);
    let mut board = Board::new(&tables);
    assert_invariants(&board, &tables);
    walk(&mut board, &tables, &mut regen, 3);
}

#[test]
fn invariants_hold_in_a_tactical_middlegame() {
    let tables = load_magic_tables();
    let mut regen = RegenCache::new(1 << 12);
    let mut board = Board::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        &tables,
    )
    .unwrap();
    assert_invariants(&board, &tables);
    walk(&mut board, &tables, &mut regen, 2);
}

#[test]
fn invariants_hold_around_en_passant_and_promotion() {
    let tables = load_magic_tables();
    let mut regen = RegenCache::new(1 << 12);
    for fen in [
        "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1",
        "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1",
    ] {
        let mut board = Board::from_fen(fen, &tables).unwrap();
        assert_invariants(&board, &tables);
        walk(&mut board, &tables, &mut regen, 3);
    }
}

#[test]
fn fifty_move_clock_counts_and_resets() {
    let tables = load_magic_tables();
    let mut regen = RegenCache::new(1 << 10);
    let mut board = Board::new(&tables);
    for (text, expected_clock) in [
        ("g1f3", 1),
        ("g8f6", 2),
        ("b1c3", 3),
        ("b8c6", 4),
        ("e2e4", 0), // pawn move resets
        ("f6e4", 0), // capture resets
    ] {
        let mv = find_legal(&mut board, &tables, &mut regen, text).unwrap();
        make_move(&mut board, mv, &tables, &mut regen);
        assert_eq!(board.halfmove_clock, expected_clock, "after {}", text);
    }
}

#[test]
fn ply_counter_is_monotonic_and_reversible() {
    let tables = load_magic_tables();
    let mut regen = RegenCache::new(1 << 10);
    let mut board = Board::new(&tables);
    for (i, text) in ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"].iter().enumerate() {
        let mv = find_legal(&mut board, &tables, &mut regen, text).unwrap();
        make_move(&mut board, mv, &tables, &mut regen);
        assert_eq!(board.plies as usize, i + 1);
        assert_eq!(board.history.len(), i + 1);
    }
    for _ in 0..5 {
        unmake_move(&mut board);
    }
    assert_eq!(board.plies, 0);
    assert!(board.history.is_empty());
}

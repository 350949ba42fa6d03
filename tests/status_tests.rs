use gambit::board::{Board, Color};
use gambit::moves::execute::{find_legal, make_move};
use gambit::moves::magic::MagicTables;
use gambit::moves::magic::loader::load_magic_tables;
use gambit::moves::square_control::RegenCache;
use gambit::status::{GameStatus, position_status};

fn play(board: &mut Board, tables: &MagicTables, regen: &mut RegenCache, line: &[&str]) {
    for text in line {
        let mv = find_legal(board, tables, regen, text)
            .unwrap_or_else(|| panic!("{} should be legal in {}", text, board.to_fen()));
        make_move(board, mv, tables, regen);
    }
}

#[test]
fn ruy_lopez_line_yields_the_expected_fen() {
    let tables = load_magic_tables();
    let mut regen = RegenCache::new(1 << 10);
    let mut board = Board::new(&tables);
    play(
        &mut board,
        &tables,
        &mut regen,
        &["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"],
    );
    assert_eq!(
        board.to_fen(),
        "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3"
    );
}

#[test]
fn legality_checker_accepts_and_rejects_per_position() {
    let tables = load_magic_tables();
    let mut regen = RegenCache::new(1 << 10);
    let mut board = Board::from_fen(
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2",
        &tables,
    )
    .unwrap();
    // the e-pawn is blockaded by its counterpart
    assert!(find_legal(&mut board, &tables, &mut regen, "e4e5").is_none());
    // castling with the f1/g1 squares still occupied is rejected
    assert!(find_legal(&mut board, &tables, &mut regen, "e1g1").is_none());
    // a normal developing move goes through
    assert!(find_legal(&mut board, &tables, &mut regen, "g1f3").is_some());
}

#[test]
fn threefold_shuffle_is_reported() {
    let tables = load_magic_tables();
    let mut regen = RegenCache::new(1 << 10);
    let mut board = Board::new(&tables);
    play(
        &mut board,
        &tables,
        &mut regen,
        &[
            "g1f3", "g8f6", "f3g1", "f6g8", // second occurrence of the start
            "g1f3", "g8f6", "f3g1", "f6g8", // third occurrence
        ],
    );
    assert_eq!(board.repetitions, 2);
    assert_eq!(
        position_status(&mut board, &tables, &mut regen),
        GameStatus::DrawThreefold
    );
}

#[test]
fn fifty_move_rule_is_reported_at_one_hundred_halfmoves() {
    let tables = load_magic_tables();
    let mut regen = RegenCache::new(1 << 10);
    let mut board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 80", &tables).unwrap();
    assert_eq!(
        position_status(&mut board, &tables, &mut regen),
        GameStatus::InPlay
    );
    let mv = find_legal(&mut board, &tables, &mut regen, "e1e2").unwrap();
    make_move(&mut board, mv, &tables, &mut regen);
    assert_eq!(board.halfmove_clock, 100);
    assert_eq!(
        position_status(&mut board, &tables, &mut regen),
        GameStatus::DrawFiftyMove
    );
}

#[test]
fn mates_name_the_mated_color() {
    let tables = load_magic_tables();
    let mut regen = RegenCache::new(1 << 10);

    let mut white_mated =
        Board::from_fen("4k3/8/8/8/8/8/5q2/6rK w - - 0 1", &tables).unwrap();
    assert_eq!(
        position_status(&mut white_mated, &tables, &mut regen),
        GameStatus::Checkmate(Color::White)
    );

    let mut black_mated = Board::from_fen("R5k1/5ppp/8/8/8/8/8/4K3 b - - 0 1", &tables).unwrap();
    assert_eq!(
        position_status(&mut black_mated, &tables, &mut regen),
        GameStatus::Checkmate(Color::Black)
    );
}

#[test]
fn castling_through_pieces_vs_around_them() {
    let tables = load_magic_tables();
    let mut regen = RegenCache::new(1 << 10);
    // both sides' rights intact, both castles available for white
    let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", &tables).unwrap();
    assert!(find_legal(&mut board, &tables, &mut regen, "e1g1").is_some());
    assert!(find_legal(&mut board, &tables, &mut regen, "e1c1").is_some());

    let mv = find_legal(&mut board, &tables, &mut regen, "e1g1").unwrap();
    make_move(&mut board, mv, &tables, &mut regen);
    assert!(!board.has_kingside_castle(Color::White));
    assert!(!board.has_queenside_castle(Color::White));
    assert!(board.has_kingside_castle(Color::Black));
    // and black can still castle in reply
    assert!(find_legal(&mut board, &tables, &mut regen, "e8c8").is_some());
}

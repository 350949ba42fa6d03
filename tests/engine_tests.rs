use gambit::engine::Engine;
use gambit::status::GameStatus;

fn engine_for_test() -> Engine {
    let mut e = Engine::new();
    e.set_clock(1, 0); // one-second thinking budget keeps tests brisk
    e
}

#[test]
fn a_full_exchange_of_moves_round_trips() {
    let mut e = engine_for_test();
    e.new_game();
    e.submit_move("e2e4").unwrap();
    let reply = e.request_move().expect("engine answers");
    assert!(reply.len() >= 4);
    assert_eq!(e.check_game_over(), GameStatus::InPlay);
    // it is white's turn again
    assert!(e.fen().contains(" w "));
}

#[test]
fn engine_delivers_mate_when_available() {
    let mut e = engine_for_test();
    e.new_game();
    // fool's mate setup: white digs the hole, black must punish
    e.submit_move("f2f3").unwrap();
    e.submit_move("e7e5").unwrap();
    e.submit_move("g2g4").unwrap();
    // black to move: Qd8h4 is mate
    let reply = e.request_move().expect("a move exists");
    assert_eq!(reply, "d8h4");
    assert_eq!(e.check_game_over(), GameStatus::Checkmate(gambit::board::Color::White));
}

#[test]
fn threefold_is_reached_through_the_engine() {
    let mut e = engine_for_test();
    e.new_game();
    for mv in [
        "g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8",
    ] {
        e.submit_move(mv).unwrap();
    }
    assert_eq!(e.check_game_over(), GameStatus::DrawThreefold);
}

#[test]
fn illegal_moves_do_not_disturb_an_ongoing_game() {
    let mut e = engine_for_test();
    e.new_game();
    e.submit_move("d2d4").unwrap();
    let fen = e.fen();
    assert!(e.submit_move("d4d6").is_err());
    assert!(e.submit_move("e1g1").is_err());
    assert!(e.submit_move("1234").is_err());
    assert_eq!(e.fen(), fen);
    e.submit_move("d7d5").unwrap();
}

#[test]
fn promotion_moves_round_trip_through_text() {
    let mut e = engine_for_test();
    e.new_game();
    // walk a pawn to promotion in a cleared corridor
    for mv in [
        "a2a4", "h7h5", "a4a5", "h5h4", "a5a6", "h4h3", "a6b7", "h3g2",
    ] {
        e.submit_move(mv).unwrap();
    }
    // white promotes, capturing into the corner; lowercase promo accepted
    e.submit_move("b7a8q").unwrap();
    assert!(e.fen().starts_with("Q"));
}

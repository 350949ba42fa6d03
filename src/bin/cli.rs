use gambit::board::Color;
use gambit::engine::Engine;
use gambit::logger::init_logging;
use gambit::moves::types::parse_move_text;
use gambit::status::GameStatus;
use std::io::{self, BufRead};

/// Line-oriented protocol adapter: reads commands from stdin, answers on
/// stdout, and routes everything through the engine facade. The engine only
/// ever sees submitted moves and requests for one.
fn main() {
    init_logging("logs/gambit.log", "gambit=info");

    let mut engine = Engine::new();
    let mut force_mode = false;
    // the protocol delivers clock halves in separate commands
    let mut increment: i64 = 0;

    let stdin = io::stdin();
    for input in stdin.lock().lines() {
        let line = match input {
            Ok(l) => l.trim().to_string(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or("");

        match command {
            "xboard" => {}
            "protover" => {
                println!("feature sigint=0 myname=\"gambit\" ping=1 done=1");
            }
            "new" => {
                engine.new_game();
                force_mode = false;
            }
            "force" => force_mode = true,
            "go" => {
                force_mode = false;
                reply_with_move(&mut engine);
            }
            "ping" => {
                let n = parts.next().unwrap_or("");
                println!("pong {}", n);
            }
            "time" => {
                // own clock, centiseconds
                if let Some(cs) = parts.next().and_then(|s| s.parse::<i64>().ok()) {
                    engine.set_clock(cs / 100, increment);
                }
            }
            "otim" => {} // opponent clock; not used
            "level" => {
                // "level MPS BASE INC" — only the increment matters to us
                let _mps = parts.next();
                let _base = parts.next();
                if let Some(inc) = parts.next().and_then(|s| s.parse::<i64>().ok()) {
                    increment = inc;
                }
            }
            "usermove" => {
                if let Some(mv) = parts.next() {
                    handle_user_move(&mut engine, mv, force_mode);
                }
            }
            "fen" => println!("{}", engine.fen()),
            "perft" => {
                if let Some(depth) = parts.next().and_then(|s| s.parse::<u32>().ok()) {
                    engine.perft(depth);
                }
            }
            "result" => {} // the game is over; wait for "new"
            "quit" => break,
            other if parse_move_text(other).is_some() => {
                handle_user_move(&mut engine, other, force_mode);
            }
            other => println!("Error (unknown command): {}", other),
        }
    }
}

fn handle_user_move(engine: &mut Engine, text: &str, force_mode: bool) {
    if let Err(reason) = engine.submit_move(text) {
        eprintln!("{}", reason);
        println!("Illegal move: {}", text);
        return;
    }
    if announce_result(engine) {
        return;
    }
    if !force_mode {
        reply_with_move(engine);
    }
}

fn reply_with_move(engine: &mut Engine) {
    if let Some(mv) = engine.request_move() {
        println!("move {}", mv);
    }
    announce_result(engine);
}

/// Report a finished (or claimable-drawn) game. Returns true when over.
fn announce_result(engine: &mut Engine) -> bool {
    let result = match engine.check_game_over() {
        GameStatus::InPlay => return false,
        GameStatus::Checkmate(Color::White) => "0-1 {White checkmated}",
        GameStatus::Checkmate(Color::Black) => "1-0 {Black checkmated}",
        GameStatus::Stalemate(Color::White) => "1/2-1/2 {White stalemated}",
        GameStatus::Stalemate(Color::Black) => "1/2-1/2 {Black stalemated}",
        GameStatus::DrawThreefold => "1/2-1/2 {Draw by threefold repetition}",
        GameStatus::DrawFiftyMove => "1/2-1/2 {Draw by the fifty move rule}",
    };
    println!("{}", result);
    true
}

use crate::board::{Board, Piece};
use crate::moves::execute::{
    is_pseudo_legal, make_move, make_null_move, unmake_move, unmake_null_move,
};
use crate::moves::list::MoveList;
use crate::moves::magic::MagicTables;
use crate::moves::movegen::{generate_captures, generate_moves};
use crate::moves::pawn::pawn_pushes_from;
use crate::moves::square_control::{RegenCache, attacks_from, in_check};
use crate::moves::types::Move;
use crate::search::context::{MAX_PLY, NUM_KILLERS, SearchClock, SearchContext};
use crate::search::eval::{is_endgame, lazy_eval};
use crate::search::pawns::PawnCache;
use crate::search::tt::{Bound, TranspositionTable};
use std::time::Duration;
use tracing::{debug, info};

pub const INFINITY: i32 = 32767;
pub const MATE: i32 = 16383;
/// Returned for repetition and fifty-move positions; could be skewed to
/// encourage or avoid draws.
pub const DRAW_SCORE: i32 = 0;

pub const MIN_DEPTH: u8 = 4;
pub const MAX_DEPTH: u8 = 63;

// aspiration windows: narrow, wider, then the full window
const ASPIRATION_1: i32 = 50;
const ASPIRATION_2: i32 = 200;

// Never lower this to 4 or below; it cripples tactical resolution.
const QUIESCENT_MAX_DEPTH: u8 = 8;

/// How far from the window a lazy score must be before futility kicks in,
/// by remaining depth (index 0 unused).
#[cfg(feature = "futility")]
const FUTILITY_MARGIN: [i32; 3] = [0, 250, 450];

#[inline(always)]
pub fn value_is_mate(v: i32) -> bool {
    v >= MATE - MAX_DEPTH as i32 || v <= -(MATE - MAX_DEPTH as i32)
}

/// Expected node types; an estimate that only tunes heuristic thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Pv,
    Cut,
    All,
}

/// Child type from the parent's type and whether the first child has
/// already been searched.
#[inline(always)]
fn child_node_type(parent: NodeType, first_searched: bool) -> NodeType {
    match (parent, first_searched) {
        (NodeType::Pv, false) => NodeType::Pv,
        (NodeType::Cut, false) => NodeType::All,
        _ => NodeType::Cut,
    }
}

/// Late-move reduction cut-in: conservative at PV nodes.
#[inline(always)]
fn lmr_move_count(node_type: NodeType) -> u32 {
    match node_type {
        NodeType::Pv => 16,
        NodeType::Cut | NodeType::All => 8,
    }
}

/// Null-move depth reduction, deeper cuts for deeper nodes.
#[inline(always)]
fn null_reduction(depth: u8) -> u8 {
    if depth > 6 { 3 } else { 2 }
}

/// A killer is quiet and non-castle by construction, but it was recorded in
/// a *different* position at this ply. Before trying it: our piece must be
/// on the source, the destination must be empty, sliders need a clear path,
/// and pawn moves must be among the legal pushes.
fn killer_is_pseudo_legal(board: &Board, mv: Move, tables: &MagicTables) -> bool {
    let color = board.side_to_move;
    if board.pieces(mv.piece, color) & mv.from.bb() == 0 {
        return false;
    }
    if board.occupied() & mv.to.bb() != 0 {
        return false;
    }
    if mv.piece == Piece::Pawn {
        pawn_pushes_from(mv.from.index(), color, board.occupied()) & mv.to.bb() != 0
    } else {
        attacks_from(mv.piece, color, mv.from.index(), board.occupied(), tables) & mv.to.bb() != 0
    }
}

/// Shared mutable search state threaded through every node.
pub struct SearchState<'a> {
    pub tables: &'a MagicTables,
    pub ctx: &'a mut SearchContext,
    pub tt: &'a mut TranspositionTable,
    pub pawn_cache: &'a mut PawnCache,
    pub regen: &'a mut RegenCache,
    /// Game ply of the position the search started from; the TT replacement
    /// policy recycles entries older than this.
    pub root_plies: u8,
}

impl SearchState<'_> {
    #[inline(always)]
    fn game_depth(&self, board: &Board) -> u8 {
        board.plies.min(255) as u8
    }
}

/// Captures-only negamax with a small depth budget. Stand pat through the
/// lazy gate, fail-soft, no transposition traffic and no draw checks.
fn quiesce(
    board: &mut Board,
    st: &mut SearchState,
    mut alpha: i32,
    beta: i32,
    depth: u8,
) -> i32 {
    if st.ctx.clock.time_up() {
        return 0;
    }
    st.ctx.nodes += 1;

    let lazy = lazy_eval(board);
    let stand_pat = if lazy > alpha - crate::search::eval::LAZY_THRESHOLD
        && lazy < beta + crate::search::eval::LAZY_THRESHOLD
    {
        st.ctx.full_evals += 1;
        crate::search::eval::eval(board, st.tables, st.pawn_cache)
    } else {
        st.ctx.lazy_evals += 1;
        lazy
    };

    if depth == 0 {
        return stand_pat;
    }

    if stand_pat > alpha {
        if stand_pat >= beta {
            return stand_pat;
        }
        alpha = stand_pat;
    }
    let mut best = stand_pat;

    let color = board.side_to_move;
    let mut list = MoveList::new();
    generate_captures(board, st.tables, &mut list);

    while let Some(mv) = list.remove_max() {
        if st.ctx.clock.time_up() {
            break;
        }
        make_move(board, mv, st.tables, st.regen);
        if in_check(board, color) {
            unmake_move(board);
            continue;
        }
        let score = -quiesce(board, st, -beta, -alpha, depth - 1);
        unmake_move(board);

        if score > best {
            best = score;
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            break;
        }
    }

    best
}

/// What one searched child did to the enclosing node.
enum ChildOutcome {
    Searched,
    SkippedIllegal,
    Cutoff,
    TimeUp,
}

struct NodeAccumulator {
    alpha: i32,
    beta: i32,
    best_score: i32,
    best_move: Option<Move>,
    bound: Bound,
    children_searched: u32,
}

/// Apply one candidate and search it with the extension/reduction policy:
/// full depth for checking moves past the first check in the branch, reduced
/// depth (with re-search) for late quiet-after-quiet moves, plain depth-1
/// otherwise.
#[allow(clippy::too_many_arguments)]
fn search_child(
    board: &mut Board,
    st: &mut SearchState,
    acc: &mut NodeAccumulator,
    mv: Move,
    depth: u8,
    ply: u16,
    prev_was_capture: bool,
    num_checks: u8,
    null_extended: bool,
    node_type: NodeType,
) -> ChildOutcome {
    let color = board.side_to_move;
    make_move(board, mv, st.tables, st.regen);
    if in_check(board, color) {
        unmake_move(board);
        return ChildOutcome::SkippedIllegal;
    }

    let first_searched = acc.children_searched > 0;
    let child_type = child_node_type(node_type, first_searched);
    let gives_check = in_check(board, board.side_to_move);

    let score = if gives_check {
        // check extension: only after the first check in this branch, so a
        // single spite check cannot balloon the tree
        let child_depth = if num_checks > 0 { depth } else { depth - 1 };
        -alphabeta(
            board,
            st,
            -acc.beta,
            -acc.alpha,
            child_depth,
            ply + 1,
            mv.is_capture(),
            num_checks.saturating_add(1),
            null_extended,
            child_type,
        )
        .0
    } else if acc.children_searched > lmr_move_count(node_type)
        && depth > 3
        && !mv.is_capture()
        && !prev_was_capture
    {
        // late-move reduction; strings of late moves reduce geometrically,
        // and a surprise improvement is re-searched one ply deeper
        let reduced = -alphabeta(
            board,
            st,
            -acc.beta,
            -acc.alpha,
            depth - 2,
            ply + 1,
            mv.is_capture(),
            num_checks,
            null_extended,
            child_node_type(node_type, true),
        )
        .0;
        if reduced > acc.alpha {
            -alphabeta(
                board,
                st,
                -acc.beta,
                -acc.alpha,
                depth - 1,
                ply + 1,
                mv.is_capture(),
                num_checks,
                null_extended,
                child_node_type(node_type, true),
            )
            .0
        } else {
            reduced
        }
    } else {
        -alphabeta(
            board,
            st,
            -acc.beta,
            -acc.alpha,
            depth - 1,
            ply + 1,
            mv.is_capture(),
            num_checks,
            null_extended,
            child_type,
        )
        .0
    };

    unmake_move(board);
    acc.children_searched += 1;

    if st.ctx.clock.time_up() {
        return ChildOutcome::TimeUp;
    }

    if score > acc.best_score {
        acc.best_score = score;
    }
    if score > acc.alpha {
        acc.alpha = score;
        acc.best_move = Some(mv);
        acc.bound = Bound::Exact;
    }
    if acc.alpha >= acc.beta {
        acc.bound = Bound::Lower;
        if !mv.is_capture() && !mv.is_castling() {
            st.ctx.insert_killer(ply as usize, mv);
        }
        return ChildOutcome::Cutoff;
    }
    ChildOutcome::Searched
}

/// Fail-soft alpha-beta. Draws are recognized before the table is consulted;
/// the horizon drops into quiescence; the hash move and killers are tried
/// before full generation; terminal mate/stalemate scores stay out of the
/// table because they are ply- and state-dependent.
#[allow(clippy::too_many_arguments)]
pub fn alphabeta(
    board: &mut Board,
    st: &mut SearchState,
    alpha: i32,
    beta: i32,
    mut depth: u8,
    ply: u16,
    prev_was_capture: bool,
    num_checks: u8,
    mut null_extended: bool,
    node_type: NodeType,
) -> (i32, Option<Move>) {
    st.ctx.nodes += 1;
    if st.ctx.clock.time_up() {
        return (0, None);
    }

    let at_root = ply == 0;

    // draw detection comes first: one prior repetition is enough in-tree
    if !at_root && (board.halfmove_clock >= 100 || board.repetitions >= 1) {
        return (DRAW_SCORE, None);
    }

    let mut acc = NodeAccumulator {
        alpha,
        beta,
        best_score: -INFINITY,
        best_move: None,
        bound: Bound::Upper,
        children_searched: 0,
    };

    // transposition probe
    let mut hash_move = None;
    let mut had_entry = false;
    if let Some(data) = st.tt.probe(board.zobrist) {
        had_entry = true;
        // move-ordering information is usable regardless of the bound
        hash_move = data.best_move;
        // a cutoff additionally needs adequate depth, and at least as many
        // repetitions as we have now (a non-draw score stored before the
        // shuffling began must not mask a draw)
        if !at_root && data.search_depth >= depth && data.reps >= board.repetitions {
            match data.bound {
                Bound::Exact => return (data.value, data.best_move),
                Bound::Lower => {
                    if data.value >= acc.beta {
                        return (data.value, data.best_move);
                    }
                    if data.value > acc.alpha {
                        acc.alpha = data.value;
                    }
                }
                Bound::Upper => {
                    if data.value <= acc.alpha {
                        return (data.value, data.best_move);
                    }
                    if data.value < acc.beta {
                        acc.beta = data.value;
                    }
                }
            }
        }
    }

    let in_check_now = in_check(board, board.side_to_move);

    // horizon: resolve captures, then cache the result as an exact leaf
    // unless better information is already stored
    if depth == 0 {
        let value = quiesce(board, st, acc.alpha, acc.beta, QUIESCENT_MAX_DEPTH);
        if st.ctx.clock.time_up() {
            return (0, None);
        }
        if !had_entry {
            let game_depth = st.game_depth(board);
            st.tt.add(
                board.zobrist,
                None,
                board.repetitions,
                value,
                st.root_plies,
                game_depth,
                0,
                Bound::Exact,
            );
        }
        return (value, None);
    }

    // futility: a ply or two from the horizon, far outside the window with
    // no check or capture in flight, children will not rescue the node
    #[cfg(feature = "futility")]
    if depth < 3 && !in_check_now && !prev_was_capture {
        let score = lazy_eval(board);
        if score + FUTILITY_MARGIN[depth as usize] < acc.alpha
            || score - FUTILITY_MARGIN[depth as usize] > acc.beta
        {
            let value = quiesce(board, st, acc.alpha, acc.beta, QUIESCENT_MAX_DEPTH);
            return (value, None);
        }
    }

    // null move: hand the opponent a free shot at a fail-high node; if even
    // that cannot reach beta the real moves will not either
    if node_type != NodeType::Pv
        && depth > 3
        && !is_endgame(board)
        && !in_check_now
        && lazy_eval(board) >= acc.beta
    {
        make_null_move(board);
        let reduced = depth - null_reduction(depth) - 1;
        let (child, _) = alphabeta(
            board,
            st,
            -acc.beta,
            -acc.beta + 1,
            reduced,
            ply + 1,
            false,
            num_checks,
            null_extended,
            NodeType::All,
        );
        unmake_null_move(board);
        let score = -child;
        if st.ctx.clock.time_up() {
            return (0, None);
        }
        if score >= acc.beta {
            return (score, None);
        }
        // doing nothing gets us mated: a real threat is hanging over this
        // line, so search it one ply deeper (once)
        if value_is_mate(score) && !null_extended {
            depth += 1;
            null_extended = true;
        }
    }

    // hash move first
    let mut cutoff = false;
    let mut timed_out = false;
    if let Some(hm) = hash_move
        && is_pseudo_legal(board, hm, st.tables)
    {
        match search_child(
            board,
            st,
            &mut acc,
            hm,
            depth,
            ply,
            prev_was_capture,
            num_checks,
            null_extended,
            node_type,
        ) {
            ChildOutcome::Cutoff => cutoff = true,
            ChildOutcome::TimeUp => timed_out = true,
            _ => {}
        }
    }

    // then the killers recorded at this ply
    if !cutoff && !timed_out {
        let killer_row = if (ply as usize) < MAX_PLY {
            st.ctx.killers[ply as usize]
        } else {
            [None; NUM_KILLERS]
        };
        for killer in killer_row.into_iter().flatten() {
            if st.ctx.clock.time_up() {
                timed_out = true;
                break;
            }
            if !killer_is_pseudo_legal(board, killer, st.tables) {
                continue;
            }
            match search_child(
                board,
                st,
                &mut acc,
                killer,
                depth,
                ply,
                prev_was_capture,
                num_checks,
                null_extended,
                node_type,
            ) {
                ChildOutcome::Cutoff => {
                    cutoff = true;
                    break;
                }
                ChildOutcome::TimeUp => {
                    timed_out = true;
                    break;
                }
                _ => {}
            }
        }
    }

    // full generation through the bucket list
    if !cutoff && !timed_out {
        let mut list = MoveList::new();
        generate_moves(board, st.tables, &mut list);
        while let Some(mv) = list.remove_max() {
            if st.ctx.clock.time_up() {
                timed_out = true;
                break;
            }
            match search_child(
                board,
                st,
                &mut acc,
                mv,
                depth,
                ply,
                prev_was_capture,
                num_checks,
                null_extended,
                node_type,
            ) {
                ChildOutcome::Cutoff => break,
                ChildOutcome::TimeUp => {
                    timed_out = true;
                    break;
                }
                _ => {}
            }
        }
    }

    // children may have stashed killers a ply deeper; stale ones would be
    // tried as pseudo-legal moves of unrelated positions
    st.ctx.clear_killer_row(ply as usize + 1);

    // a timed-out node must not pollute the table with half-searched results
    if timed_out {
        return (0, None);
    }

    if acc.children_searched == 0 {
        // no legal move: mate if in check, else stalemate. Both are depth-
        // and state-dependent, so neither is stored.
        return if in_check_now {
            (-(MATE - ply as i32), None)
        } else {
            (0, None)
        };
    }

    if !value_is_mate(acc.best_score) && acc.best_score != DRAW_SCORE {
        let game_depth = st.game_depth(board);
        st.tt.add(
            board.zobrist,
            acc.best_move,
            board.repetitions,
            acc.best_score,
            st.root_plies,
            game_depth,
            depth,
            acc.bound,
        );
    }

    (acc.best_score, acc.best_move)
}

/// The result of one `best_move` call: the move chosen by the last fully
/// completed iteration, with its score and some counters for the log.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub mv: Option<Move>,
    pub value: i32,
    pub depth: u8,
    pub nodes: u64,
}

/// Iterative deepening under a wall-clock budget. Each new depth opens with
/// an aspiration window around the previous score, widening twice before
/// falling back to the full window; a timed-out iteration is discarded in
/// favor of the previous one.
pub fn best_move(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    pawn_cache: &mut PawnCache,
    regen: &mut RegenCache,
    budget: Option<Duration>,
) -> SearchReport {
    let mut ctx = SearchContext::new(SearchClock::unlimited());
    ctx.clear_killers();

    let mut st = SearchState {
        tables,
        ctx: &mut ctx,
        tt,
        pawn_cache,
        regen,
        root_plies: board.plies.min(255) as u8,
    };

    // preliminary full-window search, deliberately before the alarm is
    // armed: whatever happens later there is always a completed result
    let mut cur_depth = MIN_DEPTH;
    let (mut prev_value, mut prev_move) = alphabeta(
        board,
        &mut st,
        -INFINITY,
        INFINITY,
        cur_depth,
        0,
        false,
        0,
        false,
        NodeType::Pv,
    );

    // now start the single-shot timer
    if let Some(limit) = budget {
        info!(seconds = limit.as_secs_f64(), "search budget armed");
        st.ctx.clock = SearchClock::start(limit);
    }

    while !st.ctx.clock.time_up() && cur_depth < MAX_DEPTH {
        report_depth(board, cur_depth, prev_value, &prev_move, st.ctx.nodes);
        cur_depth += 1;

        let mut window_low = prev_value - ASPIRATION_1;
        let mut window_high = prev_value + ASPIRATION_1;
        let (mut value, mut mv) = alphabeta(
            board,
            &mut st,
            window_low,
            window_high,
            cur_depth,
            0,
            false,
            0,
            false,
            NodeType::Pv,
        );
        if st.ctx.clock.time_up() {
            break;
        }
        if value <= window_low || value >= window_high {
            debug!(
                depth = cur_depth,
                low = window_low,
                high = window_high,
                "aspiration window failed, widening"
            );
            window_low = prev_value - ASPIRATION_2;
            window_high = prev_value + ASPIRATION_2;
            (value, mv) = alphabeta(
                board,
                &mut st,
                window_low,
                window_high,
                cur_depth,
                0,
                false,
                0,
                false,
                NodeType::Pv,
            );
            if st.ctx.clock.time_up() {
                break;
            }
        }
        if value <= window_low || value >= window_high {
            debug!(depth = cur_depth, "second window failed, full re-search");
            (value, mv) = alphabeta(
                board,
                &mut st,
                -INFINITY,
                INFINITY,
                cur_depth,
                0,
                false,
                0,
                false,
                NodeType::Pv,
            );
            if st.ctx.clock.time_up() {
                break;
            }
        }

        prev_value = value;
        prev_move = mv;
    }

    info!(
        nodes = st.ctx.nodes,
        tt_hits = st.tt.hits,
        tt_misses = st.tt.misses,
        lazy = st.ctx.lazy_evals,
        full = st.ctx.full_evals,
        "search finished"
    );
    let nodes = st.ctx.nodes;
    st.ctx.clear_killers();

    SearchReport {
        mv: prev_move,
        value: prev_value,
        depth: cur_depth,
        nodes,
    }
}

fn report_depth(board: &Board, depth: u8, value: i32, mv: &Option<Move>, nodes: u64) {
    let move_text = mv.map(|m| m.to_text()).unwrap_or_else(|| "(none)".into());
    if value_is_mate(value) {
        let winner = if (value > 0) == (board.side_to_move == crate::board::Color::White) {
            "White"
        } else {
            "Black"
        };
        let moves = (MATE - value.abs() + 1) / 2;
        info!(depth, value, nodes, %move_text, "{} mates in {}", winner, moves);
    } else {
        info!(depth, value, nodes, %move_text, "depth complete");
    }
}

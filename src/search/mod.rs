pub mod context;
pub mod eval;
pub mod pawns;
pub mod psqt;
pub mod search;
pub mod tt;

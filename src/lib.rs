//! Falling-block puzzle engine: board state, piece geometry, collision
//! checking and line clearing. Pure logic, no I/O; the terminal frontend
//! lives in the binary.

pub mod game;

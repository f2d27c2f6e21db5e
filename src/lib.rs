//! City tile rendering and traffic routing
//!
//! Declarative tile images composed from markup, and a grid router that
//! accumulates congestion on road tiles. Both run without a game engine.

pub mod engine;
pub mod graphics;

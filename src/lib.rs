//! A multiplayer property-trading board game engine with an HTTP front.
//!
//! The crate is layered bottom-up: static board data ([`board`]), the data
//! model ([`entities`]), the per-game store ([`store`]), pure money math
//! ([`economy`]), the rules engines ([`engine`]), and the cross-game
//! [`manager`] that the axum [`server`] exposes. Randomness and time are
//! injected through [`dice`] so every rule is testable with scripted dice.

pub mod board;
pub mod dice;
pub mod economy;
pub mod engine;
pub mod entities;
pub mod errors;
pub mod manager;
pub mod server;
pub mod store;

pub use errors::{EngineError, EngineResult, ErrorKind};
pub use manager::GameManager;

//! Rafter's simulation core: the entity universe and its components, rails, and the world
//! renderer, tied together by [`game_state::GameState`].

pub mod components;
pub mod config;
pub mod demo;
pub mod entities;
pub mod game_state;
pub mod input;
pub mod rails;
pub mod render;
pub mod services;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

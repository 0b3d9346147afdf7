pub mod collections;
pub mod config;
pub mod engine;
pub mod game;
pub mod gfx;
pub mod math;
pub mod util;

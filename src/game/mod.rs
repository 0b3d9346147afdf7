mod composite;
mod entity;
pub mod pointer;
mod scene;

pub use composite::*;
pub use entity::*;
pub use pointer::Pointer;
pub use scene::*;

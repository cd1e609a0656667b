pub mod entrance;
pub mod fill;
pub mod graph;
pub mod item_pool;
pub mod rules;
pub mod settings;
pub mod spoiler_log;
pub mod traverse;
pub mod world;

pub use world::{generate, Placement, TunicWorld};

pub mod maps;
pub mod reports;

pub use maps::{GameMap, MapPool};

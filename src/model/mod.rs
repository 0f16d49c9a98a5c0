mod player;
mod tournament;

pub use player::*;
pub use tournament::*;

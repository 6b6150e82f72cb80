pub mod config;
pub mod entities;
pub mod error;
pub mod tool;
pub mod turn;

pub use config::Config;
pub use error::{Error, Result};
pub use turn::{Cortex, TurnState, TurnStateDelta};

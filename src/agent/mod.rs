mod agent;
pub mod prompt;

pub use agent::{Agent, TurnHandle};

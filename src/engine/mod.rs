mod events;
mod runner;
mod state;
mod technique;

pub use events::EngineEvent;
pub use runner::ScenarioEngine;
#[cfg(test)]
pub use state::Clock;
pub use state::{OutcomeStatus, ScenarioResult, ScenarioStatus};

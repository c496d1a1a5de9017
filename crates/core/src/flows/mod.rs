pub mod engine;
pub mod states;

pub use engine::{all_constraints_configured, constraints_and_readings_ready, SessionOrchestrator};
pub use states::{
    AutoStep, AutoTrigger, CommandOutcome, OperationOutput, SessionCommand, TurnOutcome,
};

pub mod mandate;
pub mod orchestrator;
pub mod queue;
pub mod retention;
pub mod scheduler;

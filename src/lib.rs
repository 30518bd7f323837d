pub mod core;
pub mod generation;
pub mod orchestrator;
pub mod retrieval;
pub mod server;
pub mod state;

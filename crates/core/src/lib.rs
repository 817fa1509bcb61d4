pub mod config;
pub mod pipeline;
pub mod runtime;
pub mod state;
pub mod types;

mod cadence;
mod scheduler;
mod shutdown;

pub use cadence::Cadence;
pub use scheduler::Runtime;
pub use shutdown::ShutdownGuard;

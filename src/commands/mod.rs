pub mod start;
mod watchdog;

pub use start::run_start;
pub use watchdog::run_watchdog;

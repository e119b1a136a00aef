//! Configuration for a single throwaway server.
//!
//! - `options` - caller-facing [`Options`], defaults, and resolution into [`Config`]
//! - `duration` - human-readable duration strings ("30s", "500ms")

mod duration;
mod options;

pub use duration::*;
pub use options::*;

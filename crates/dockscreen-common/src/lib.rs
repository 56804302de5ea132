//! dockscreen-common: shared types, errors, and the sandboxed HTTP client used across all Dockscreen crates.

pub mod error;
pub mod entities;
pub mod sandbox;

// Re-export commonly used types
pub use entities::{Compound, CompoundId};
pub use error::{Result, ScreenError};
pub use sandbox::SandboxClient;

//! Aircraft landing scheduling on one or more runways, solved to proven
//! optimality by a logic-based Benders decomposition.

pub mod error;
pub mod generate;
pub mod instance;
pub mod model;
pub mod resolution;

pub use error::AlpError;
pub use instance::{Instance, Plane, SeparationMatrix};
pub use resolution::{solve, DecompositionConfig, DecompositionOutcome, Schedule, Termination};

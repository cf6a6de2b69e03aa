//! Capability provider seam.
//!
//! Agents are external collaborators invoked through one narrow interface;
//! the engine dispatches to them by capability key and never knows about
//! their transport, pagination, or credential handling.

pub mod error;
pub mod registry;
pub mod traits;

pub use error::AgentError;
pub use registry::{AgentRegistry, Capability, ModeSpec, RegistryError};
pub use traits::{Agent, ParamMap};

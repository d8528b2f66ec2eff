//! The node interface percussion voices render through.
//!
//! A node renders mono blocks on demand, can be retriggered, and reports
//! when it has gone quiet so the mixer can drop it.

/// Core traits shared by all graph nodes.
pub mod node;

pub use node::{GraphNode, RenderCtx};

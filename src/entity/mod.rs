//! Concrete entity models
//!
//! The managed tree is a workspace containing roles and templates; templates
//! reference roles by name and carry an unordered parameter list whose ids
//! the server assigns. These models exercise every part of the runtime: the
//! conversion protocol, both registry collect passes, and both matching
//! strategies.

pub mod role;
pub mod template;
pub mod workspace;

pub use role::{ROLE_CATEGORY, Role};
pub use template::{Parameter, Quota, TEMPLATE_CATEGORY, Template};
pub use workspace::Workspace;

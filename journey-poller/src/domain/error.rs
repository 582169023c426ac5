//! Domain error types.
//!
//! These errors represent validation failures in the route model.
//! They are raised before any network I/O and are distinct from
//! transport or upstream errors.

/// Validation failure for a route request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required route field is blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Route name is blank
    #[error("route name must not be empty")]
    EmptyRouteName,
}

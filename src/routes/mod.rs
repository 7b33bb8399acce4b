/// Router Module Index
///
/// Routing is split by access level so each guard is applied once, at the router
/// layer, instead of being remembered per handler:
///
/// - `public`: no token required.
/// - `authenticated`: bearer guard.
/// - `admin`: bearer guard plus the admin role gate.

/// Routes accessible to anonymous visitors.
pub mod public;

/// Routes requiring a valid bearer token.
pub mod authenticated;

/// Routes restricted to principals with the `admin` role.
pub mod admin;

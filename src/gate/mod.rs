//! Password-reset gate: route classifier, decision table and the axum
//! middleware that dispatches the decision.

mod decision;
pub mod middleware;
pub mod routes;

pub use decision::{decide, Decision};
pub use middleware::{enforce, Gate};
pub use routes::{RouteClass, RouteError, RouteMatcher};

pub const HOME_PATH: &str = "/";
pub const RESET_PASSWORD_PATH: &str = "/reset-password";
pub const RESET_PASSWORD_API_PATH: &str = "/api/reset-password";

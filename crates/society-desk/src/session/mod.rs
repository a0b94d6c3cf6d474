//! Session lifecycle shared by every screen of the desk.

mod guard;
mod routes;
mod state;

pub use guard::SessionGuard;
pub use routes::{protected_route_redirect, RouteGroup, HOME_ROUTE, LOGIN_ROUTE};
pub use state::{AuthChange, AuthEvent, SessionState, Subscription};

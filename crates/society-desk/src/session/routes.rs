pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/";

/// Top-level route groups of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    /// Login, sign-up and password recovery screens.
    Auth,
    /// Tabbed home area; requires a session.
    Tabs,
}

/// Decides where a navigation into `group` should be redirected.
///
/// `authenticated` is `None` while the initial session check is still in
/// flight; no redirect happens until it resolves.
pub fn protected_route_redirect(
    authenticated: Option<bool>,
    group: RouteGroup,
) -> Option<&'static str> {
    match (authenticated?, group) {
        (false, RouteGroup::Tabs) => Some(LOGIN_ROUTE),
        (true, RouteGroup::Auth) => Some(HOME_ROUTE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirects_follow_auth_state() {
        assert_eq!(protected_route_redirect(None, RouteGroup::Tabs), None);
        assert_eq!(
            protected_route_redirect(Some(false), RouteGroup::Tabs),
            Some(LOGIN_ROUTE)
        );
        assert_eq!(protected_route_redirect(Some(false), RouteGroup::Auth), None);
        assert_eq!(
            protected_route_redirect(Some(true), RouteGroup::Auth),
            Some(HOME_ROUTE)
        );
        assert_eq!(protected_route_redirect(Some(true), RouteGroup::Tabs), None);
    }
}

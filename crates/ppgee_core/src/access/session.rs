//! Single active user and the view it currently has open.

use super::router::{ViewGrant, ViewRouter};
use super::view::{View, DEFAULT_VIEW};
use crate::auth::{AuthError, CredentialVerifier};
use crate::model::user::User;
use log::info;

/// Current user plus the routed view. Every role change re-routes.
#[derive(Debug, Clone)]
pub struct Session {
    user: User,
    grant: ViewGrant,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Starts as the anonymous viewer on the default view.
    pub fn new() -> Self {
        Self::for_user(User::viewer())
    }

    /// Starts as `user` on the default view.
    pub fn for_user(user: User) -> Self {
        let grant = ViewRouter::route(user.role, DEFAULT_VIEW);
        Self { user, grant }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn view(&self) -> View {
        self.grant.view()
    }

    pub fn grant(&self) -> ViewGrant {
        self.grant
    }

    /// Opens `requested`, or the default view when the role may not see it.
    pub fn navigate(&mut self, requested: View) -> ViewGrant {
        self.grant = ViewRouter::route(self.user.role, requested);
        self.grant
    }

    /// Switches to the administrator when `token` verifies. The current view
    /// is kept. A wrong code leaves the session unchanged.
    pub fn login(
        &mut self,
        verifier: &dyn CredentialVerifier,
        token: &str,
    ) -> Result<bool, AuthError> {
        if !verifier.verify(token)? {
            return Ok(false);
        }
        self.user = User::administrator();
        self.grant = ViewRouter::route(self.user.role, self.grant.view());
        info!(
            "event=session_login module=access status=ok role={}",
            self.user.role
        );
        Ok(true)
    }

    /// Back to the viewer on the default view.
    pub fn logout(&mut self) {
        self.user = User::viewer();
        self.grant = ViewRouter::route(self.user.role, DEFAULT_VIEW);
        info!(
            "event=session_logout module=access status=ok role={}",
            self.user.role
        );
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::access::View;
    use crate::auth::{AuthError, CredentialVerifier};
    use crate::model::user::Role;

    struct FixedCode(&'static str);

    impl CredentialVerifier for FixedCode {
        fn verify(&self, token: &str) -> Result<bool, AuthError> {
            if token.trim().is_empty() {
                return Err(AuthError::MissingToken);
            }
            Ok(token == self.0)
        }
    }

    #[test]
    fn starts_as_viewer_on_dashboard() {
        let session = Session::new();
        assert_eq!(session.user().role, Role::Viewer);
        assert_eq!(session.view(), View::Dashboard);
    }

    #[test]
    fn viewer_navigation_to_restricted_view_is_redirected() {
        let mut session = Session::new();
        assert_eq!(session.navigate(View::Admin).view(), View::Dashboard);
        assert_eq!(session.navigate(View::Turmas).view(), View::Turmas);
    }

    #[test]
    fn login_switches_role_and_logout_resets_view() {
        let mut session = Session::new();
        let verifier = FixedCode("123456");

        assert!(!session.login(&verifier, "000000").expect("login"));
        assert_eq!(session.user().role, Role::Viewer);

        assert!(session.login(&verifier, "123456").expect("login"));
        assert_eq!(session.user().role, Role::Administrator);
        assert_eq!(session.navigate(View::DataManagement).view(), View::DataManagement);

        session.logout();
        assert_eq!(session.user().role, Role::Viewer);
        assert_eq!(session.view(), View::Dashboard);
    }

    #[test]
    fn missing_token_is_an_error() {
        let mut session = Session::new();
        assert_eq!(
            session.login(&FixedCode("1"), " "),
            Err(AuthError::MissingToken)
        );
    }
}

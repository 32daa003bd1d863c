use nk_core::{User, View};
use tracing::info;

use crate::router::ViewRouter;

/// The router plus whoever is signed in.
#[derive(Debug, Default)]
pub struct AppShell {
    router: ViewRouter,
    user: Option<User>,
}

impl AppShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn router(&self) -> &ViewRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut ViewRouter {
        &mut self.router
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Accept a profile from the identity provider. A reader signing in on
    /// the landing page is taken straight to the home feed.
    pub fn sign_in(&mut self, user: User) {
        info!("👤 Signed in as {}", user.email);
        self.user = Some(user);
        if self.router.current_view() == View::Landing {
            self.router.navigate_to(View::Home);
        }
    }

    /// Forget the profile. The current view is kept.
    pub fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            info!("👋 Signed out {}", user.email);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            name: "Thandi Mokoena".to_string(),
            email: "thandi@example.com".to_string(),
            picture: "https://example.com/p.png".to_string(),
        }
    }

    #[test]
    fn test_sign_in_from_landing_goes_home() {
        let mut shell = AppShell::new();
        shell.sign_in(user());
        assert_eq!(shell.router().current_view(), View::Home);
        assert_eq!(shell.user().and_then(User::first_name), Some("Thandi"));
    }

    #[test]
    fn test_sign_in_elsewhere_keeps_view() {
        let mut shell = AppShell::new();
        shell.router_mut().navigate_to(View::Admin);
        shell.sign_in(user());
        assert_eq!(shell.router().current_view(), View::Admin);
    }

    #[test]
    fn test_sign_out_keeps_view() {
        let mut shell = AppShell::new();
        shell.sign_in(user());
        shell.router_mut().navigate_to(View::Weather);
        shell.sign_out();
        assert!(shell.user().is_none());
        assert_eq!(shell.router().current_view(), View::Weather);
    }
}

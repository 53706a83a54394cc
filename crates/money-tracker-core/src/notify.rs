//! User-facing side channels: notifications and navigation.
//!
//! The session client never renders anything itself. It reports failures
//! through a `Notifier` and asks a `Navigator` to send the user to the login
//! screen when the session cannot be recovered.

use tracing::{error, info};

/// Route of the login screen.
pub const LOGIN_ROUTE: &str = "/login";

pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);

    fn success(&self, message: &str);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str, replace: bool);

    fn navigate_to_login(&self) {
        self.navigate(LOGIN_ROUTE, true);
    }
}

/// Routes notifications into the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        error!(message, "Request failed");
    }

    fn success(&self, message: &str) {
        info!(message, "Request succeeded");
    }
}

/// Navigator for headless use; records the request in the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str, replace: bool) {
        info!(route, replace, "Navigation requested");
    }
}

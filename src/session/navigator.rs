//! Navigation seam used for login redirects after session teardown.

/// Moves the user to another route.
///
/// Browser front ends change the location; headless embedders can log or
/// ignore the request.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator for headless use: records the redirect in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) {
        tracing::warn!(%path, "session ended; navigation to login required");
    }
}

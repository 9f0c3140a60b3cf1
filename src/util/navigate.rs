//! Redirect primitive used by logout and the route guard.

#[cfg(test)]
#[path = "navigate_test.rs"]
mod navigate_test;

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str, options: NavigateOptions);
}

/// Navigator that records every redirect and logs it. The CLI uses it as its
/// "router"; tests use it to assert on redirects.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All paths navigated to, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn current(&self) -> Option<String> {
        self.history.lock().ok().and_then(|h| h.last().cloned())
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, path: &str, options: NavigateOptions) {
        tracing::info!(path, replace = options.replace, "navigate");
        if let Ok(mut history) = self.history.lock() {
            if options.replace {
                history.pop();
            }
            history.push(path.to_owned());
        }
    }
}

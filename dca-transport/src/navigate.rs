//! Page navigation triggered by backend status codes

use std::sync::Mutex;
use std::sync::PoisonError;

/// Sends the user to another page.
///
/// The client calls this when a response demands it, e.g. `/activate` for
/// an account that is not activated yet.
pub trait Navigator: Send + Sync {
    /// Navigates to `path`.
    fn navigate(&self, path: &str);
}

/// A navigator that only logs the destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) {
        log::info!("navigate to {}", path);
    }
}

/// A navigator that records every destination.
///
/// Useful for tests.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Creates a navigator with no recorded destinations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded destinations in order.
    pub fn visited(&self) -> Vec<String> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the last destination, if any.
    pub fn last(&self) -> Option<String> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}

impl<T: Navigator + ?Sized> Navigator for std::sync::Arc<T> {
    fn navigate(&self, path: &str) {
        (**self).navigate(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_navigator() {
        let navigator = RecordingNavigator::new();
        assert_eq!(navigator.last(), None);
        navigator.navigate("/activate");
        navigator.navigate("/purchase");
        assert_eq!(navigator.visited(), vec!["/activate", "/purchase"]);
        assert_eq!(navigator.last().as_deref(), Some("/purchase"));
    }
}

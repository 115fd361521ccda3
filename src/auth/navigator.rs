use std::sync::Mutex;

use tracing::debug;

/// A client location, with the page that sent us here when it was a redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub from: Option<String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            from: None,
        }
    }

    /// A redirect that remembers where the user was headed
    pub fn redirect(path: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            from: Some(from.into()),
        }
    }
}

/// Controls the current client location
pub trait Navigator: Send + Sync {
    fn current(&self) -> Location;

    /// Push a new location onto the history
    fn navigate(&self, to: Location);

    /// Replace the current location without growing the history
    fn replace(&self, to: Location);
}

/// In-process history stack
#[derive(Debug)]
pub struct MemoryRouter {
    history: Mutex<Vec<Location>>,
}

impl MemoryRouter {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![Location::new(initial)]),
        }
    }

    /// Every location visited, oldest first
    pub fn history(&self) -> Vec<Location> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Location>> {
        match self.history.lock() {
            Ok(history) => history,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MemoryRouter {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryRouter {
    fn current(&self) -> Location {
        self.lock()
            .last()
            .cloned()
            .unwrap_or_else(|| Location::new("/"))
    }

    fn navigate(&self, to: Location) {
        debug!(path = %to.path, "Navigating");
        self.lock().push(to);
    }

    fn replace(&self, to: Location) {
        debug!(path = %to.path, from = ?to.from, "Replacing location");
        let mut history = self.lock();
        history.pop();
        history.push(to);
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Navigation seam between the client core and whatever shell displays it.

use std::sync::Mutex;

/// Client routes the core navigates to on its own.
pub mod routes {
    pub const HOME: &str = "/";
    pub const LOGIN: &str = "/login";
    pub const ESTABLISHMENTS: &str = "/etablissements";
    pub const FAVORITES: &str = "/favorites";
}

/// Something that can show a route (a router, a terminal UI, a test double).
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> String;
    fn navigate(&self, route: &str);
}

/// In-memory navigator that records every route it was sent to.
pub struct HistoryNavigator {
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new(initial: &str) -> Self {
        Self {
            history: Mutex::new(vec![initial.to_string()]),
        }
    }

    /// Every route visited, oldest first, including the initial one.
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new(routes::HOME)
    }
}

impl Navigator for HistoryNavigator {
    fn current_route(&self) -> String {
        self.history
            .lock()
            .ok()
            .and_then(|h| h.last().cloned())
            .unwrap_or_else(|| routes::HOME.to_string())
    }

    fn navigate(&self, route: &str) {
        tracing::debug!(route, "Navigating");
        if let Ok(mut h) = self.history.lock() {
            h.push(route.to_string());
        }
    }
}

/// Go to the login screen unless already there.
pub fn redirect_to_login(navigator: &dyn Navigator) {
    if navigator.current_route() == routes::LOGIN {
        return;
    }
    navigator.navigate(routes::LOGIN);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_does_not_loop_on_login() {
        let nav = HistoryNavigator::new(routes::ESTABLISHMENTS);
        redirect_to_login(&nav);
        redirect_to_login(&nav);
        assert_eq!(nav.history(), vec![routes::ESTABLISHMENTS, routes::LOGIN]);
    }
}

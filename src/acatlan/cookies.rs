//! Session cookies carried across the three negotiation steps.
//!
//! The ASP backend hands out its session cookie on the menu page and may add
//! more on the selection POST; the report GET must present all of them.

use cookie::Cookie;
use reqwest::header::{HeaderMap, SET_COOKIE};
use tracing::{debug, trace};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    pairs: Vec<(String, String)>,
}

impl SessionCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Record a single `Set-Cookie` value. Attributes (path, expiry, ...) are ignored.
    ///
    /// Every pair is appended in issue order, even when the name is already held:
    /// the report page expects the step-1 session cookie to still be present.
    pub fn insert_set_cookie(&mut self, raw: &str) {
        let parsed = match Cookie::parse(raw) {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, "ignoring malformed Set-Cookie header");
                return;
            }
        };

        self.pairs.push((parsed.name().to_owned(), parsed.value().to_owned()));
    }

    /// Absorb every `Set-Cookie` header of a response.
    pub fn absorb(&mut self, headers: &HeaderMap) {
        let before = self.pairs.len();
        for value in headers.get_all(SET_COOKIE) {
            match value.to_str() {
                Ok(raw) => self.insert_set_cookie(raw),
                Err(_) => debug!("ignoring non-ASCII Set-Cookie header"),
            }
        }
        trace!(
            added = self.pairs.len() - before,
            total = self.pairs.len(),
            "absorbed response cookies"
        );
    }

    /// `Cookie` request header value, or `None` when no cookies are held.
    pub fn header_value(&self) -> Option<String> {
        if self.pairs.is_empty() {
            return None;
        }
        Some(
            self.pairs
                .iter()
                .map(|(n, v)| format!("{n}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

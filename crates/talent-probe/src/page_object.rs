//! Page Object Model support.
//!
//! A page object wraps one view of the application. It owns no element
//! handles, only locators, and tracks whether its load verification has
//! passed since the last navigation.

use crate::result::ProbeResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Verification state of a page object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Navigated (or never checked); nothing proven about the view
    Unverified,
    /// Load verification passed
    Verified,
}

/// Lock-free holder for [`PageState`]
#[derive(Debug, Default)]
pub struct StateCell(AtomicBool);

impl StateCell {
    /// Current state
    #[must_use]
    pub fn get(&self) -> PageState {
        if self.0.load(Ordering::Acquire) {
            PageState::Verified
        } else {
            PageState::Unverified
        }
    }

    /// Back to unverified
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Promote to verified
    pub fn promote(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Trait for page objects
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Get the page name for logging/debugging
    fn page_name(&self) -> &'static str;

    /// URL pattern that matches this page
    fn url_pattern(&self) -> UrlMatcher;

    /// Current verification state
    fn state(&self) -> PageState;

    /// Navigate to the page's canonical URL; leaves it unverified
    async fn goto(&self) -> ProbeResult<()>;

    /// Poll until the view is usable; promotes to verified
    async fn verify_page_loaded(&self) -> ProbeResult<()>;
}

/// Path component of an absolute or relative URL, without query or fragment
#[must_use]
pub fn path_of(url: &str) -> &str {
    let rest = url
        .split_once("://")
        .map_or(url, |(_, after_scheme)| {
            after_scheme.find('/').map_or("/", |i| &after_scheme[i..])
        });
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    let path = &rest[..end];
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// URL pattern matcher for page objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatcher {
    pattern: String,
    segments: Vec<UrlSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UrlSegment {
    Literal(String),
    Wildcard,
    Parameter(String),
    Numeric(String),
}

impl UrlMatcher {
    /// Create a new URL matcher from a pattern
    ///
    /// Patterns support:
    /// - Literal segments: `/positions`
    /// - Wildcards: `/positions/*`
    /// - Named parameters: `/positions/:slug`
    /// - Numeric parameters: `/positions/#id` (ASCII digits only)
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    UrlSegment::Wildcard
                } else if let Some(name) = s.strip_prefix(':') {
                    UrlSegment::Parameter(name.to_string())
                } else if let Some(name) = s.strip_prefix('#') {
                    UrlSegment::Numeric(name.to_string())
                } else {
                    UrlSegment::Literal(s.to_string())
                }
            })
            .collect();

        Self {
            pattern: pattern.to_string(),
            segments,
        }
    }

    /// The pattern as written
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check if a URL's path matches the pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        let url_segments: Vec<&str> = path_of(url).split('/').filter(|s| !s.is_empty()).collect();

        // Wildcards and parameters each consume exactly one segment
        if url_segments.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(&url_segments)
            .all(|(segment, value)| match segment {
                UrlSegment::Literal(lit) => lit == value,
                UrlSegment::Wildcard | UrlSegment::Parameter(_) => true,
                UrlSegment::Numeric(_) => value.bytes().all(|b| b.is_ascii_digit()),
            })
    }

    /// Extract parameters from a matching URL
    #[must_use]
    pub fn extract_params(&self, url: &str) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if !self.matches(url) {
            return params;
        }
        let url_segments = path_of(url).split('/').filter(|s| !s.is_empty());
        for (segment, value) in self.segments.iter().zip(url_segments) {
            if let UrlSegment::Parameter(name) | UrlSegment::Numeric(name) = segment {
                let _ = params.insert(name.clone(), value.to_string());
            }
        }
        params
    }
}

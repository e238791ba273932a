//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a query expression, never an element handle. Every use
//! re-executes the query against the live document, so counts and visibility
//! always reflect current state.
//!
//! # Design Philosophy
//!
//! - **Strict Selection**: element-level reads fail if several elements match
//! - **Scoped Chains**: `column.locator(card)` searches inside the column's
//!   subtree instead of walking ancestor chains upward
//! - **Fluent API**: chainable methods for building selectors

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::time::Duration;

/// Attribute carrying the application's semantic markers
pub const TEST_ID_ATTRIBUTE: &str = "data-testid";

/// A point in viewport coordinates (CSS pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation toward `other`; `t` in `[0, 1]`
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Bounding box for an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point is inside this bounding box
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// A box with finite coordinates and a non-zero area
    #[must_use]
    pub fn is_measurable(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., `select`, `input[type="date"]`)
    Css(String),
    /// Exact `data-testid` marker
    TestId(String),
    /// `data-testid` marker prefix (e.g., `candidate-card-`)
    TestIdPrefix(String),
    /// CSS selector filtered by contained text
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
    /// Accessible role with a case-insensitive name pattern
    Role {
        /// ARIA role (e.g., `button`)
        role: String,
        /// Name pattern, matched case-insensitively
        name: String,
    },
    /// Input placeholder text
    Placeholder(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a test ID prefix selector
    #[must_use]
    pub fn test_id_prefix(prefix: impl Into<String>) -> Self {
        Self::TestIdPrefix(prefix.into())
    }

    /// Create a role selector
    #[must_use]
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.into(),
        }
    }

    /// The CSS part used to enumerate candidates
    #[must_use]
    pub fn css_query(&self) -> String {
        match self {
            Self::Css(css) | Self::CssWithText { css, .. } => css.clone(),
            Self::TestId(id) => {
                format!("[{TEST_ID_ATTRIBUTE}=\"{}\"]", escape_css_value(id))
            }
            Self::TestIdPrefix(prefix) => {
                format!("[{TEST_ID_ATTRIBUTE}^=\"{}\"]", escape_css_value(prefix))
            }
            Self::Role { role, .. } => role_css(role),
            Self::Placeholder(text) => format!("[placeholder=\"{}\"]", escape_css_value(text)),
        }
    }

    /// Optional JavaScript predicate narrowing the CSS matches
    #[must_use]
    pub fn js_filter(&self) -> Option<String> {
        match self {
            Self::CssWithText { text, .. } => Some(format!(
                "el => (el.textContent || '').includes({})",
                js_string(text)
            )),
            Self::Role { name, .. } => Some(format!(
                "el => new RegExp({}, 'i').test(((el.getAttribute('aria-label') || el.textContent) || '').trim())",
                js_string(name)
            )),
            Self::Css(_) | Self::TestId(_) | Self::TestIdPrefix(_) | Self::Placeholder(_) => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "css={css}"),
            Self::TestId(id) => write!(f, "testid={id}"),
            Self::TestIdPrefix(prefix) => write!(f, "testid^={prefix}"),
            Self::CssWithText { css, text } => write!(f, "css={css}[text*={text:?}]"),
            Self::Role { role, name } => write!(f, "role={role}[name=/{name}/i]"),
            Self::Placeholder(text) => write!(f, "placeholder={text:?}"),
        }
    }
}

/// CSS for elements exposing an ARIA role implicitly or explicitly
fn role_css(role: &str) -> String {
    match role {
        "button" => {
            r#"button, [role="button"], input[type="button"], input[type="submit"]"#.to_string()
        }
        "link" => r#"a[href], [role="link"]"#.to_string(),
        other => format!("[role=\"{}\"]", escape_css_value(other)),
    }
}

fn escape_css_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quote a string as a JavaScript literal
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// One link of a scoped locator chain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocatorStep {
    /// Selector evaluated inside the previous step's matches
    pub selector: Selector,
    /// Keep only the n-th match (document order)
    pub pick: Option<usize>,
}

/// Locator options for customizing behavior
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocatorOptions {
    /// Override for the configured expectation timeout
    pub timeout: Option<Duration>,
    /// Whether to require strict single-element match
    pub strict: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            strict: true,
        }
    }
}

/// A lazily evaluated, re-queryable element query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    steps: Vec<LocatorStep>,
    options: LocatorOptions,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(selector.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            steps: vec![LocatorStep {
                selector,
                pick: None,
            }],
            options: LocatorOptions::default(),
        }
    }

    /// Locate by exact `data-testid`
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::from_selector(Selector::test_id(id))
    }

    /// Locate by `data-testid` prefix
    #[must_use]
    pub fn test_id_prefix(prefix: impl Into<String>) -> Self {
        Self::from_selector(Selector::test_id_prefix(prefix))
    }

    /// Locate by role and case-insensitive name pattern
    #[must_use]
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::from_selector(Selector::role(role, name))
    }

    /// Search for `selector` inside this locator's matches
    #[must_use]
    pub fn locator(&self, selector: Selector) -> Self {
        let mut steps = self.steps.clone();
        steps.push(LocatorStep {
            selector,
            pick: None,
        });
        Self {
            steps,
            options: self.options.clone(),
        }
    }

    /// Re-root this locator inside `scope`
    #[must_use]
    pub fn within(&self, scope: &Self) -> Self {
        let mut steps = scope.steps.clone();
        steps.extend(self.steps.iter().cloned());
        Self {
            steps,
            options: self.options.clone(),
        }
    }

    /// Filter by text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        if let Some(last) = self.steps.last_mut() {
            if let Selector::Css(css) = &last.selector {
                last.selector = Selector::CssWithText {
                    css: css.clone(),
                    text: text.into(),
                };
            }
        }
        self
    }

    /// Keep only the n-th match
    #[must_use]
    pub fn nth(mut self, index: usize) -> Self {
        if let Some(last) = self.steps.last_mut() {
            last.pick = Some(index);
        }
        self
    }

    /// Keep only the first match
    #[must_use]
    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Disable strict mode (allow multiple matches)
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    /// Get the chain of steps
    #[must_use]
    pub fn steps(&self) -> &[LocatorStep] {
        &self.steps
    }

    /// Get the innermost selector
    #[must_use]
    pub fn selector(&self) -> &Selector {
        // A locator always has at least one step
        &self.steps[self.steps.len() - 1].selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Whether element-level reads must see exactly one match
    #[must_use]
    pub fn requires_unique(&self) -> bool {
        self.options.strict && self.steps.last().is_some_and(|s| s.pick.is_none())
    }

    /// JavaScript expression evaluating to the array of matched elements
    #[must_use]
    pub fn to_js(&self) -> String {
        let mut js = String::from("(() => { let els = [document];");
        for step in &self.steps {
            let css = js_string(&step.selector.css_query());
            let _ = write!(
                js,
                " els = Array.from(new Set(els.flatMap(r => Array.from(r.querySelectorAll({css})))));"
            );
            if let Some(filter) = step.selector.js_filter() {
                let _ = write!(js, " els = els.filter({filter});");
            }
            if let Some(i) = step.pick {
                let _ = write!(js, " els = els.slice({i}, {});", i + 1);
            }
        }
        js.push_str(" return els; })()");
        js
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " >> ")?;
            }
            write!(f, "{}", step.selector)?;
            if let Some(n) = step.pick {
                write!(f, " >> nth={n}")?;
            }
        }
        Ok(())
    }
}

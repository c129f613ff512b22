//! Typed element descriptors and the fallback-chain resolver.
//!
//! A [`SelectorList`] is an ordered chain of [`Candidate`]s, most stable
//! first. Resolution walks the chain and takes the first match that passes
//! the caller's [`Constraints`] — declared order is the contract, there is
//! no scoring or ranking.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::clock::Clock;
use crate::driver::{ElementRef, UiDriver};
use crate::error::{FlowError, Result};

/// One way of finding an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// Exact CSS selector.
    Css(&'static str),
    /// Attribute-fragment match, `base[attr*="needle"]`. An empty base
    /// matches any element.
    AttrContains {
        base: &'static str,
        attr: &'static str,
        needle: &'static str,
    },
    /// Element of `base` whose text content contains `needle`. Not
    /// expressible as CSS; drivers fall back to a text scan.
    Text {
        base: &'static str,
        needle: &'static str,
    },
    /// Element whose class attribute contains the fragment.
    ClassFragment(&'static str),
}

impl Candidate {
    /// CSS form for engines that take selectors directly; `None` for text
    /// candidates.
    pub fn css_query(&self) -> Option<String> {
        match self {
            Candidate::Css(css) => Some((*css).to_string()),
            Candidate::AttrContains { base, attr, needle } => {
                Some(format!(r#"{base}[{attr}*="{needle}"]"#))
            }
            Candidate::ClassFragment(fragment) => Some(format!(r#"[class*="{fragment}"]"#)),
            Candidate::Text { .. } => None,
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Text { base, needle } => write!(f, r#"{base}:has-text("{needle}")"#),
            other => match other.css_query() {
                Some(css) => f.write_str(&css),
                None => Ok(()),
            },
        }
    }
}

/// Filters applied on top of structural matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Constraints {
    pub visible: bool,
    pub enabled: bool,
}

impl Constraints {
    /// Structural match only.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn visible() -> Self {
        Self { visible: true, enabled: false }
    }

    /// Visible AND enabled; a visible-but-disabled control is skipped, not
    /// accepted.
    pub fn actionable() -> Self {
        Self { visible: true, enabled: true }
    }
}

/// Named, ordered fallback chain for one UI affordance. The name feeds
/// error diagnostics.
#[derive(Debug, Clone)]
pub struct SelectorList {
    pub name: &'static str,
    pub candidates: Vec<Candidate>,
}

impl SelectorList {
    pub fn new(name: &'static str, candidates: Vec<Candidate>) -> Self {
        Self { name, candidates }
    }

    /// Rendered descriptors of every candidate, for diagnostics.
    pub fn descriptors(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.to_string()).collect()
    }
}

/// First candidate that matches under `constraints`, or `Ok(None)` when the
/// whole chain misses. Driver failures propagate; a miss never does.
pub async fn try_resolve(
    driver: &dyn UiDriver,
    list: &SelectorList,
    constraints: Constraints,
) -> Result<Option<ElementRef>> {
    for candidate in &list.candidates {
        if let Some(el) = driver.query(candidate, constraints).await? {
            debug!(target = "flowbot", list = list.name, candidate = %candidate, "resolved");
            return Ok(Some(el));
        }
    }
    Ok(None)
}

/// Like [`try_resolve`], but a miss is an `ElementNotFound` carrying every
/// attempted descriptor.
pub async fn resolve(
    driver: &dyn UiDriver,
    list: &SelectorList,
    constraints: Constraints,
) -> Result<ElementRef> {
    match try_resolve(driver, list, constraints).await? {
        Some(el) => Ok(el),
        None => Err(FlowError::ElementNotFound {
            what: list.name,
            attempted: list.descriptors(),
        }),
    }
}

const PROBE_INTERVAL: Duration = Duration::from_millis(500);

/// Re-run the chain on a short interval until something matches or the
/// bound elapses. Exhaustion means the UI no longer has the affordance at
/// all, so it surfaces as `ElementNotFound` rather than a timeout.
pub async fn resolve_within(
    driver: &dyn UiDriver,
    clock: &dyn Clock,
    list: &SelectorList,
    constraints: Constraints,
    timeout: Duration,
) -> Result<ElementRef> {
    let mut waited = Duration::ZERO;
    loop {
        if let Some(el) = try_resolve(driver, list, constraints).await? {
            return Ok(el);
        }
        if waited >= timeout {
            return Err(FlowError::ElementNotFound {
                what: list.name,
                attempted: list.descriptors(),
            });
        }
        clock.sleep(PROBE_INTERVAL).await;
        waited += PROBE_INTERVAL;
    }
}

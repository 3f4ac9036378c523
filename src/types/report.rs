use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Request-scoped receiver of `DECORATE` payloads.
pub trait DecorationSink {
    fn add_decoration(&mut self, value: String);
    fn add_named_decoration(&mut self, key: String, value: String);
}

/// The default decoration sink: unnamed decorations in application order and
/// named decorations grouped by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Decorations {
    pub unnamed: Vec<String>,
    pub named: BTreeMap<String, Vec<String>>,
}

impl Decorations {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unnamed.is_empty() && self.named.is_empty()
    }
}

impl DecorationSink for Decorations {
    fn add_decoration(&mut self, value: String) {
        self.unnamed.push(value);
    }

    fn add_named_decoration(&mut self, key: String, value: String) {
        self.named.entry(key).or_default().push(value);
    }
}

/// Summary returned by [`RewriteEngine::rewrite()`](crate::RewriteEngine::rewrite).
///
/// Holds the `_log` message of every applied rule in application order, how
/// many actions were skipped because of request-time errors, whether the time
/// budget cut the rewrite short, the collected decorations, and the wall-clock
/// duration.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct RewriteReport {
    pub(crate) applied: Vec<String>,
    pub(crate) skipped: usize,
    pub(crate) truncated: bool,
    pub(crate) decorations: Decorations,
    pub(crate) duration: Duration,
}

impl RewriteReport {
    /// `_log` messages of applied rules, in application order.
    #[must_use]
    pub fn applied(&self) -> &[String] {
        &self.applied
    }

    /// Number of actions skipped because a sub-query failed to build.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Whether the time budget stopped the rewrite before every action was
    /// applied.
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    #[must_use]
    pub fn decorations(&self) -> &Decorations {
        &self.decorations
    }

    pub fn into_decorations(self) -> Decorations {
        self.decorations
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for RewriteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "applied: [{}]", self.applied.join(", "))?;
        if self.skipped > 0 {
            write!(f, ", skipped: {}", self.skipped)?;
        }
        if self.truncated {
            write!(f, ", truncated")?;
        }
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decorations_group_named_values() {
        let mut d = Decorations::default();
        assert!(d.is_empty());
        d.add_decoration("redirect".into());
        d.add_named_decoration("banner".into(), "sale".into());
        d.add_named_decoration("banner".into(), "new".into());
        assert_eq!(d.unnamed, vec!["redirect"]);
        assert_eq!(d.named["banner"], vec!["sale", "new"]);
    }

    #[test]
    fn decorations_serialize_to_json() {
        let mut d = Decorations::default();
        d.add_named_decoration("k".into(), "v".into());
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json, serde_json::json!({"unnamed": [], "named": {"k": ["v"]}}));
    }

    #[test]
    fn report_display() {
        let report = RewriteReport {
            applied: vec!["r1".into(), "r2".into()],
            skipped: 1,
            truncated: false,
            decorations: Decorations::default(),
            duration: Duration::from_nanos(500),
        };
        let s = report.to_string();
        assert!(s.contains("applied: [r1, r2]"));
        assert!(s.contains("skipped: 1"));
        assert!(!s.contains("truncated"));
    }
}

/// Pattern rules and matching logic for Only One Tab
use std::fmt;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::url_info::UrlInfo;

/// Prefix that marks a wildcard rule (`*.example.com`)
pub const WILDCARD_MARKER: &str = "*.";

/// Domain-like text accepted for exact and base-domain rules
static DOMAIN_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9\-_.]*[a-zA-Z0-9]$").expect("domain token regex is valid")
});

/// How a rule's text is compared against a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Exact,
    Wildcard,
    #[serde(rename = "base")]
    BaseDomain,
    Regex,
}

/// What a matching rule returns as the tracking key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Every matching URL collapses to the rule's own pattern
    #[serde(rename = "base")]
    BaseDomain,
    /// Each distinct host is its own group
    Subdomain,
    /// Host plus path
    Path,
}

/// A user-defined grouping rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRule {
    pub pattern: String,
    #[serde(rename = "type")]
    pub kind: PatternKind,
    pub group_by: GroupBy,
}

impl PatternRule {
    /// Build a rule from user input, trimming it and lowercasing domain-like text
    pub fn new(pattern: &str, kind: PatternKind, group_by: GroupBy) -> PatternRule {
        let pattern = match kind {
            PatternKind::Regex => pattern.trim().to_string(),
            _ => pattern.trim().to_lowercase(),
        };

        PatternRule {
            pattern,
            kind,
            group_by,
        }
    }

    /// Check the rule text against the grammar of its kind
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pattern.is_empty() {
            return Err(ValidationError::Empty);
        }

        match self.kind {
            PatternKind::Wildcard => {
                let base = self.pattern.strip_prefix(WILDCARD_MARKER);
                if base.is_some_and(|base| !base.is_empty()) {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidWildcard {
                        pattern: self.pattern.clone(),
                    })
                }
            }
            PatternKind::Exact | PatternKind::BaseDomain => {
                if DOMAIN_TOKEN.is_match(&self.pattern) {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidDomain {
                        pattern: self.pattern.clone(),
                    })
                }
            }
            PatternKind::Regex => Regex::new(&self.pattern).map(|_| ()).map_err(|e| {
                ValidationError::InvalidRegex {
                    pattern: self.pattern.clone(),
                    message: e.to_string(),
                }
            }),
        }
    }

    /// Human-readable summary shown next to the rule
    pub fn description(&self) -> String {
        match self.kind {
            PatternKind::Exact => format!("Matches only {}", self.pattern),
            PatternKind::Wildcard => {
                let base = wildcard_base(&self.pattern);
                format!(
                    "Matches {base} and all subdomains like app.{base}, www.{base}, etc."
                )
            }
            PatternKind::BaseDomain => {
                format!("Matches {} and all its subdomains", self.pattern)
            }
            PatternKind::Regex => "Custom pattern".to_string(),
        }
    }
}

impl fmt::Display for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, by {:?})", self.pattern, self.kind, self.group_by)
    }
}

/// Decide whether a classified URL satisfies one rule
///
/// Wildcard and base-domain rules both accept the bare domain as well as
/// any subdomain of it:
/// - `*.github.com` and `github.com` (base) match `github.com`, `gist.github.com`
/// - neither matches `notgithub.com`
///
/// Regex rules are tested against the full URL; a regex that fails to
/// compile never matches.
pub fn matches(url: &UrlInfo, rule: &PatternRule) -> bool {
    match rule.kind {
        PatternKind::Exact => url.host == rule.pattern,
        PatternKind::Wildcard => covers_domain(&url.host, wildcard_base(&rule.pattern)),
        PatternKind::BaseDomain => covers_domain(&url.host, &rule.pattern),
        PatternKind::Regex => match Regex::new(&rule.pattern) {
            Ok(regex) => regex.is_match(&url.raw),
            Err(e) => {
                debug!("Ignoring rule with invalid regex {:?}: {}", rule.pattern, e);
                false
            }
        },
    }
}

fn wildcard_base(pattern: &str) -> &str {
    pattern.strip_prefix(WILDCARD_MARKER).unwrap_or(pattern)
}

/// `host` is `base` itself or one of its subdomains
fn covers_domain(host: &str, base: &str) -> bool {
    host == base
        || host
            .strip_suffix(base)
            .map_or(false, |prefix| prefix.ends_with('.'))
}

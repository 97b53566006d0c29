/// Tracking-key resolution: which group a URL belongs to, if any
use serde::{Deserialize, Serialize};

use crate::pattern::{GroupBy, PatternRule, matches};
use crate::url_info::{UrlInfo, classify};

/// Global tracking policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    /// Every page is tracked, keyed by its hostname
    #[default]
    All,
    /// Only pages matching a configured rule are tracked
    Specific,
}

/// Result of resolving a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tracking {
    Tracked(String),
    Untracked,
}

impl Tracking {
    pub fn key(&self) -> Option<&str> {
        match self {
            Tracking::Tracked(key) => Some(key),
            Tracking::Untracked => None,
        }
    }

    pub fn into_key(self) -> Option<String> {
        match self {
            Tracking::Tracked(key) => Some(key),
            Tracking::Untracked => None,
        }
    }

    /// Empty keys (e.g. URLs without a host) never group anything
    fn from_key(key: String) -> Tracking {
        if key.is_empty() {
            Tracking::Untracked
        } else {
            Tracking::Tracked(key)
        }
    }
}

/// Compute the deduplication key for a URL
///
/// In `All` mode the key is the hostname and `rules` is never read.
/// In `Specific` mode the first matching rule decides the key:
/// - group by base domain → the rule's pattern
/// - group by subdomain → the URL's host
/// - group by path → host + path (query and fragment excluded)
pub fn resolve(url: &str, mode: TrackingMode, rules: &[PatternRule]) -> Tracking {
    let Ok(info) = classify(url) else {
        return Tracking::Untracked;
    };

    match mode {
        TrackingMode::All => Tracking::from_key(info.host),
        TrackingMode::Specific => first_match(&info, rules)
            .map(|rule| Tracking::from_key(key_for(&info, rule)))
            .unwrap_or(Tracking::Untracked),
    }
}

/// The rule that decides a URL's group in `Specific` mode
pub fn matched_rule<'a>(url: &str, rules: &'a [PatternRule]) -> Option<&'a PatternRule> {
    classify(url).ok().and_then(|info| first_match(&info, rules))
}

fn first_match<'a>(info: &UrlInfo, rules: &'a [PatternRule]) -> Option<&'a PatternRule> {
    rules.iter().find(|rule| matches(info, rule))
}

fn key_for(info: &UrlInfo, rule: &PatternRule) -> String {
    match rule.group_by {
        GroupBy::BaseDomain => rule.pattern.clone(),
        GroupBy::Subdomain => info.host.clone(),
        GroupBy::Path => format!("{}{}", info.host, info.path),
    }
}

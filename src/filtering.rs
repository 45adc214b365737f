use crate::config::{FilterConfig, FilterMode, MatchType, SourceEntry};
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

/// Sender-address filter, built once from configuration. Regex entries are
/// compiled up front so a bad pattern fails at startup, not per message.
pub struct SourceFilter {
    mode: FilterMode,
    entries: Vec<CompiledEntry>,
}

struct CompiledEntry {
    label: Option<String>,
    matcher: Matcher,
}

enum Matcher {
    Exact(String),
    Contains(String),
    Pattern(Regex),
}

impl Matcher {
    fn matches(&self, address: &str) -> bool {
        match self {
            Matcher::Exact(value) => address.to_lowercase() == *value,
            Matcher::Contains(value) => address.to_lowercase().contains(value.as_str()),
            Matcher::Pattern(regex) => regex.is_match(address),
        }
    }
}

impl SourceFilter {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        let mut entries = Vec::with_capacity(config.sources.len());
        for source in &config.sources {
            entries.push(CompiledEntry::compile(source)?);
        }

        Ok(SourceFilter {
            mode: config.mode,
            entries,
        })
    }

    /// Whether a record from this sender should enter the pipeline.
    pub fn should_include(&self, address: &str) -> bool {
        match self.mode {
            FilterMode::None => true,
            FilterMode::Include => self.matches_any(address),
            FilterMode::Exclude => !self.matches_any(address),
        }
    }

    /// Display label of the first source entry matching this sender.
    pub fn match_label(&self, address: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.matcher.matches(address))
            .and_then(|entry| entry.label.as_deref())
    }

    fn matches_any(&self, address: &str) -> bool {
        self.entries.iter().any(|entry| entry.matcher.matches(address))
    }
}

impl CompiledEntry {
    fn compile(source: &SourceEntry) -> Result<Self> {
        let matcher = match source.match_type {
            MatchType::Exact => Matcher::Exact(source.value.to_lowercase()),
            MatchType::Contains => Matcher::Contains(source.value.to_lowercase()),
            MatchType::Regex => Matcher::Pattern(
                RegexBuilder::new(&source.value)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("invalid source pattern: {}", source.value))?,
            ),
        };

        let label = if source.label.trim().is_empty() {
            None
        } else {
            Some(source.label.clone())
        };

        Ok(CompiledEntry { label, matcher })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(value: &str, match_type: MatchType, label: &str) -> SourceEntry {
        SourceEntry {
            value: value.to_string(),
            match_type,
            label: label.to_string(),
        }
    }

    fn filter(mode: FilterMode, sources: Vec<SourceEntry>) -> SourceFilter {
        SourceFilter::new(&FilterConfig { mode, sources }).unwrap()
    }

    #[test]
    fn test_mode_none_includes_everything() {
        let filter = filter(
            FilterMode::None,
            vec![entry("BANK", MatchType::Exact, "")],
        );
        assert!(filter.should_include("BANK"));
        assert!(filter.should_include("anyone-else"));
    }

    #[test]
    fn test_include_mode() {
        let filter = filter(
            FilterMode::Include,
            vec![entry("bank", MatchType::Exact, "My bank")],
        );
        assert!(filter.should_include("BANK"));
        assert!(!filter.should_include("SPAMMER"));
    }

    #[test]
    fn test_exclude_mode() {
        let filter = filter(
            FilterMode::Exclude,
            vec![entry("promo", MatchType::Contains, "")],
        );
        assert!(!filter.should_include("ACME-PROMO"));
        assert!(filter.should_include("+15550001111"));
    }

    #[test]
    fn test_regex_match_case_insensitive() {
        let filter = filter(
            FilterMode::Include,
            vec![entry(r"^\+9725\d+$", MatchType::Regex, "Israeli mobile")],
        );
        assert!(filter.should_include("+972501234567"));
        assert!(!filter.should_include("+15550001111"));
        assert_eq!(filter.match_label("+972501234567"), Some("Israeli mobile"));
    }

    #[test]
    fn test_empty_label_is_none() {
        let filter = filter(
            FilterMode::Include,
            vec![entry("BANK", MatchType::Exact, "  ")],
        );
        assert_eq!(filter.match_label("BANK"), None);
    }

    #[test]
    fn test_label_of_first_matching_entry() {
        let filter = filter(
            FilterMode::None,
            vec![
                entry("bank", MatchType::Contains, "Bank"),
                entry("bankofexample", MatchType::Exact, "Bank of Example"),
            ],
        );
        assert_eq!(filter.match_label("bankofexample"), Some("Bank"));
    }

    #[test]
    fn test_invalid_regex_fails_at_construction() {
        let result = SourceFilter::new(&FilterConfig {
            mode: FilterMode::Include,
            sources: vec![entry("(unclosed", MatchType::Regex, "")],
        });
        assert!(result.is_err());
    }
}

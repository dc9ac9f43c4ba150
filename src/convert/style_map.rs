//! Style mapping rules for rich-text conversion.
//!
//! A rule maps a named Word style to an HTML element:
//!
//! ```text
//! p[style-name='Heading 1'] => h1:fresh
//! r[style-name='Strong'] => strong
//! ```
//!
//! `p` rules apply to paragraph styles, `r` rules to character (run) styles.
//! Style names compare case-insensitively. Without `:fresh`, consecutive
//! paragraphs mapped by the same rule are merged into one element.

use crate::error::{Error, Result};
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

const RULE_PATTERN: &str = r"^\s*(?P<target>[pr])\[style-name='(?P<name>[^']*)'\]\s*=>\s*(?P<tag>[a-zA-Z][a-zA-Z0-9]*)(?P<fresh>:fresh)?\s*$";

fn rule_regex() -> &'static Regex {
    static RULE: OnceLock<Regex> = OnceLock::new();
    RULE.get_or_init(|| Regex::new(RULE_PATTERN).expect("style rule pattern is valid"))
}

/// What a rule matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTarget {
    /// Paragraph style (`p[...]`)
    Paragraph,
    /// Character style (`r[...]`)
    Run,
}

/// A single style mapping rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleMapping {
    /// Paragraph or run rule
    pub target: StyleTarget,
    /// Style display name to match
    pub style_name: String,
    /// HTML tag to emit
    pub tag: String,
    /// Always open a new element
    pub fresh: bool,
}

impl StyleMapping {
    /// Create a paragraph rule.
    pub fn paragraph(style_name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            target: StyleTarget::Paragraph,
            style_name: style_name.into(),
            tag: tag.into(),
            fresh: false,
        }
    }

    /// Create a run rule.
    pub fn run(style_name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            target: StyleTarget::Run,
            style_name: style_name.into(),
            tag: tag.into(),
            fresh: false,
        }
    }

    /// Mark the rule as fresh.
    pub fn fresh(mut self) -> Self {
        self.fresh = true;
        self
    }

    fn matches(&self, target: StyleTarget, style_name: &str) -> bool {
        self.target == target && self.style_name.eq_ignore_ascii_case(style_name)
    }
}

impl FromStr for StyleMapping {
    type Err = Error;

    fn from_str(rule: &str) -> Result<Self> {
        let caps = rule_regex()
            .captures(rule)
            .ok_or_else(|| Error::InvalidStyleMapping(rule.trim().to_string()))?;

        let target = match &caps["target"] {
            "p" => StyleTarget::Paragraph,
            _ => StyleTarget::Run,
        };

        Ok(Self {
            target,
            style_name: caps["name"].to_string(),
            tag: caps["tag"].to_ascii_lowercase(),
            fresh: caps.name("fresh").is_some(),
        })
    }
}

/// An ordered set of style mapping rules; the first matching rule wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    rules: Vec<StyleMapping>,
}

impl StyleMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `Heading 1`..`Heading 3` to fresh `h1`..`h3`.
    pub fn default_headings() -> Self {
        let rules = (1..=3)
            .map(|level| {
                StyleMapping::paragraph(format!("Heading {}", level), format!("h{}", level))
                    .fresh()
            })
            .collect();
        Self { rules }
    }

    /// Parse rules, one per line. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let rules = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(StyleMapping::from_str)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Append a rule.
    pub fn push(&mut self, rule: StyleMapping) {
        self.rules.push(rule);
    }

    /// Append all rules of another map after this map's rules.
    pub fn extend(&mut self, other: StyleMap) {
        self.rules.extend(other.rules);
    }

    /// Builder form of [`StyleMap::push`].
    pub fn with_rule(mut self, rule: StyleMapping) -> Self {
        self.push(rule);
        self
    }

    /// Rules in priority order.
    pub fn rules(&self) -> &[StyleMapping] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the map has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule for a paragraph style name.
    pub fn paragraph_rule(&self, style_name: &str) -> Option<&StyleMapping> {
        self.find(StyleTarget::Paragraph, style_name)
    }

    /// Rule for a character style name.
    pub fn run_rule(&self, style_name: &str) -> Option<&StyleMapping> {
        self.find(StyleTarget::Run, style_name)
    }

    fn find(&self, target: StyleTarget, style_name: &str) -> Option<&StyleMapping> {
        self.rules.iter().find(|r| r.matches(target, style_name))
    }
}

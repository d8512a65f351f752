//! Inspection providers.
//!
//! An [`Inspector`] looks at a block of text in a given language and reports [`Finding`]s with
//! character offsets relative to that block. Findings become non-persistent insights via
//! [`insight_from_finding`]. Providers run on the analysis thread, so they are `Send + Sync`.

use crate::error::InspectionError;
use crate::insight::{Insight, InsightKind};
use novelist_core_lang::ProjectLanguage;
use regex::Regex;
use std::ops::Range;

/// One issue reported by an inspection provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Start character offset in the inspected text.
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
    /// Message for the user.
    pub message: String,
    /// Replacement candidates.
    pub suggestions: Vec<String>,
    /// Provider category string, e.g. `"Grammar"` or `"TYPOS"`.
    pub category: String,
}

/// A source of findings (spell checker, grammar service, built-in rules).
pub trait Inspector: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Inspect `text` written in `language`.
    fn inspect(&self, text: &str, language: &ProjectLanguage) -> Result<Vec<Finding>, InspectionError>;
}

/// Wrap a finding into a non-persistent insight, shifting it by `offset` into document positions.
pub fn insight_from_finding(finding: &Finding, offset: usize) -> Insight {
    let kind = InsightKind::from_category(&finding.category, finding.suggestions.clone());
    Insight::new(
        offset + finding.start..offset + finding.end,
        kind,
        finding.message.clone(),
    )
    .with_persistent(false)
}

fn char_range(text: &str, bytes: Range<usize>) -> Range<usize> {
    let start = text[..bytes.start].chars().count();
    let len = text[bytes.clone()].chars().count();
    start..start + len
}

/// A single regex rule with a fixed replacement.
#[derive(Debug, Clone)]
pub struct RegexRule {
    regex: Regex,
    category: String,
    message: String,
    replacement: Option<String>,
}

impl RegexRule {
    /// Compile a rule.
    pub fn new(pattern: &str, category: &str, message: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            category: category.to_string(),
            message: message.to_string(),
            replacement: None,
        })
    }

    /// Suggest `replacement` for every match.
    pub fn with_replacement(mut self, replacement: &str) -> Self {
        self.replacement = Some(replacement.to_string());
        self
    }

    fn findings<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Finding> + 'a {
        self.regex.find_iter(text).map(move |m| {
            let range = char_range(text, m.range());
            Finding {
                start: range.start,
                end: range.end,
                message: self.message.clone(),
                suggestions: self.replacement.iter().cloned().collect(),
                category: self.category.clone(),
            }
        })
    }
}

/// Runs a list of [`RegexRule`]s.
#[derive(Debug, Clone)]
pub struct RegexInspector {
    name: String,
    rules: Vec<RegexRule>,
}

impl RegexInspector {
    /// Create an inspector from rules.
    pub fn new(name: impl Into<String>, rules: Vec<RegexRule>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }
}

impl Inspector for RegexInspector {
    fn name(&self) -> &str {
        &self.name
    }

    fn inspect(&self, text: &str, _language: &ProjectLanguage) -> Result<Vec<Finding>, InspectionError> {
        let mut findings: Vec<Finding> = self.rules.iter().flat_map(|r| r.findings(text)).collect();
        findings.sort_by_key(|f| (f.start, f.end));
        Ok(findings)
    }
}

/// Built-in typography checks: straight double quotes and repeated spaces.
#[derive(Debug, Clone)]
pub struct TypographyInspector {
    straight_quote: Regex,
    multiple_spaces: RegexRule,
}

impl TypographyInspector {
    /// Category reported for every finding.
    pub const CATEGORY: &'static str = "Typography";

    /// Compile the built-in rules.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            straight_quote: Regex::new("\"")?,
            multiple_spaces: RegexRule::new(" {2,}", Self::CATEGORY, "Multiple spaces")?
                .with_replacement(" "),
        })
    }
}

impl Inspector for TypographyInspector {
    fn name(&self) -> &str {
        "typography"
    }

    fn inspect(&self, text: &str, language: &ProjectLanguage) -> Result<Vec<Finding>, InspectionError> {
        let quotes = language.quotes().primary;
        let mut findings: Vec<Finding> = self
            .straight_quote
            .find_iter(text)
            .map(|m| {
                // Opening if at the start or after whitespace/opening punctuation.
                let opening = text[..m.start()]
                    .chars()
                    .next_back()
                    .is_none_or(|c| c.is_whitespace() || "([{\u{2014}\u{2013}".contains(c));
                let suggestion = if opening {
                    quotes.outer_open
                } else {
                    quotes.outer_close
                };
                let range = char_range(text, m.range());
                Finding {
                    start: range.start,
                    end: range.end,
                    message: "Straight quotation mark".to_string(),
                    suggestions: vec![suggestion.to_string()],
                    category: Self::CATEGORY.to_string(),
                }
            })
            .collect();

        findings.extend(self.multiple_spaces.findings(text));
        findings.sort_by_key(|f| (f.start, f.end));
        Ok(findings)
    }
}

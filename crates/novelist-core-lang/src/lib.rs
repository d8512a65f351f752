#![warn(missing_docs)]
//! `novelist-core-lang` - language data used by `novelist-core`.
//!
//! This crate stays lightweight and does **not** depend on any spell-checking or grammar
//! service. It provides the small amount of language knowledge the document engine needs:
//! language tags (`en-US`), quotation marks, and sentence-completion detection.
//!
//! Languages are looked up through an explicit [`LanguageRegistry`] value instead of a
//! process-wide table, so tests and hosts can construct isolated instances.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported novel languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    /// English.
    English,
    /// German.
    German,
}

impl Language {
    /// ISO 639-1 language code (e.g. `en`).
    pub const fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::German => "de",
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::German => "German",
        }
    }

    /// Quotation marks used by this language.
    pub const fn quotes(self) -> LanguageQuotes {
        match self {
            Language::English => LanguageQuotes {
                primary: QuotationMarks::new("\u{201C}", "\u{201D}", "\u{2018}", "\u{2019}"),
                alternative: QuotationMarks::new("\u{2018}", "\u{2019}", "\u{201C}", "\u{201D}"),
            },
            Language::German => LanguageQuotes {
                primary: QuotationMarks::new("\u{201E}", "\u{201C}", "\u{201A}", "\u{2018}"),
                alternative: QuotationMarks::new("\u{00BB}", "\u{00AB}", "\u{203A}", "\u{2039}"),
            },
        }
    }
}

/// Countries whose dialects are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Country {
    /// United States.
    UnitedStates,
    /// United Kingdom.
    UnitedKingdom,
    /// Australia.
    Australia,
    /// Germany.
    Germany,
    /// Austria.
    Austria,
    /// Switzerland.
    Switzerland,
}

impl Country {
    /// Country code as used in language tags (e.g. `US`).
    pub const fn code(self) -> &'static str {
        match self {
            Country::UnitedStates => "US",
            Country::UnitedKingdom => "UK",
            Country::Australia => "AU",
            Country::Germany => "DE",
            Country::Austria => "AT",
            Country::Switzerland => "CH",
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Country::UnitedStates => "United States",
            Country::UnitedKingdom => "United Kingdom",
            Country::Australia => "Australia",
            Country::Germany => "Germany",
            Country::Austria => "Austria",
            Country::Switzerland => "Switzerland",
        }
    }
}

/// A pair of outer and inner quotation marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotationMarks {
    /// Opening outer quote.
    pub outer_open: &'static str,
    /// Closing outer quote.
    pub outer_close: &'static str,
    /// Opening inner quote.
    pub inner_open: &'static str,
    /// Closing inner quote.
    pub inner_close: &'static str,
}

impl QuotationMarks {
    const fn new(
        outer_open: &'static str,
        outer_close: &'static str,
        inner_open: &'static str,
        inner_close: &'static str,
    ) -> Self {
        Self {
            outer_open,
            outer_close,
            inner_open,
            inner_close,
        }
    }

    fn closing(&self) -> [&'static str; 2] {
        [self.outer_close, self.inner_close]
    }
}

/// Primary and alternative quotation styles of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageQuotes {
    /// Preferred quotation marks.
    pub primary: QuotationMarks,
    /// Alternative quotation marks (e.g. guillemets in German).
    pub alternative: QuotationMarks,
}

/// Errors produced when parsing language tags.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LanguageError {
    /// The tag is not of the form `xx-YY`.
    #[error("malformed language tag '{0}'")]
    MalformedTag(String),
    /// The tag is well-formed but the language/country pair is not supported.
    #[error("unsupported language tag '{0}'")]
    Unsupported(String),
}

/// A language as used by a project: language plus regional variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectLanguage {
    /// Base language.
    pub language: Language,
    /// Regional variant.
    pub country: Country,
}

impl ProjectLanguage {
    /// Create a project language.
    pub const fn new(language: Language, country: Country) -> Self {
        Self { language, country }
    }

    /// Language tag such as `en-US`.
    pub fn identifier(&self) -> String {
        format!("{}-{}", self.language.code(), self.country.code())
    }

    /// Description such as `English (United States)`.
    pub fn description(&self) -> String {
        format!("{} ({})", self.language.name(), self.country.name())
    }

    /// Quotation marks of the base language.
    pub fn quotes(&self) -> LanguageQuotes {
        self.language.quotes()
    }

    /// Returns `true` if `text` ends with sentence-final punctuation, optionally followed by
    /// closing quotation marks or brackets.
    ///
    /// Used to decide whether a typing run completed a sentence.
    pub fn is_complete_sentence(&self, text: &str) -> bool {
        let quotes = self.quotes();
        let closers: Vec<&str> = quotes
            .primary
            .closing()
            .into_iter()
            .chain(quotes.alternative.closing())
            .chain(["\"", "'", ")", "]"])
            .collect();

        let mut rest = text.trim_end();
        loop {
            match closers.iter().find(|c| rest.ends_with(*c)) {
                Some(closer) => rest = &rest[..rest.len() - closer.len()],
                None => break,
            }
        }

        rest.ends_with(['.', '!', '?', '\u{2026}'])
    }
}

impl Default for ProjectLanguage {
    fn default() -> Self {
        Self::new(Language::English, Country::UnitedStates)
    }
}

impl fmt::Display for ProjectLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier())
    }
}

impl FromStr for ProjectLanguage {
    type Err = LanguageError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        LanguageRegistry::with_defaults().parse(tag)
    }
}

/// The set of language/country combinations a host supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRegistry {
    entries: Vec<ProjectLanguage>,
}

impl LanguageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registry with every built-in combination.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (language, country) in [
            (Language::English, Country::UnitedStates),
            (Language::English, Country::UnitedKingdom),
            (Language::English, Country::Australia),
            (Language::German, Country::Germany),
            (Language::German, Country::Austria),
            (Language::German, Country::Switzerland),
        ] {
            registry.register(ProjectLanguage::new(language, country));
        }
        registry
    }

    /// Register a combination. Duplicate registrations are ignored.
    pub fn register(&mut self, language: ProjectLanguage) {
        if !self.entries.contains(&language) {
            self.entries.push(language);
        }
    }

    /// Look up a registered combination.
    pub fn get(&self, language: Language, country: Country) -> Option<ProjectLanguage> {
        self.entries
            .iter()
            .copied()
            .find(|l| l.language == language && l.country == country)
    }

    /// All countries registered for `language`, in registration order.
    pub fn countries_for(&self, language: Language) -> Vec<Country> {
        self.entries
            .iter()
            .filter(|l| l.language == language)
            .map(|l| l.country)
            .collect()
    }

    /// All registered combinations.
    pub fn languages(&self) -> &[ProjectLanguage] {
        &self.entries
    }

    /// Parse a language tag (`en-US`, case-insensitive, `_` accepted as separator).
    pub fn parse(&self, tag: &str) -> Result<ProjectLanguage, LanguageError> {
        let normalized = tag.trim().replace('_', "-");
        let Some((lang, country)) = normalized.split_once('-') else {
            return Err(LanguageError::MalformedTag(tag.to_string()));
        };
        if lang.is_empty() || country.is_empty() {
            return Err(LanguageError::MalformedTag(tag.to_string()));
        }

        self.entries
            .iter()
            .copied()
            .find(|l| {
                l.language.code().eq_ignore_ascii_case(lang)
                    && l.country.code().eq_ignore_ascii_case(country)
            })
            .ok_or_else(|| LanguageError::Unsupported(tag.to_string()))
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

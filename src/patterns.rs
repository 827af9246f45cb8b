//! Lexical pattern configuration and its compiled form.
//!
//! The default lists are tuned for English-language financial and industrial
//! reports. They are plain data so a calibration file can replace any of them;
//! [`Patterns::compile`] turns them into case-insensitive regex sets once, and
//! the compiled sets are shared read-only by every classifier.

use regex::{Regex, RegexBuilder, RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

const TEMPORAL_PATTERNS: &[&str] = &[
    r"(?:^|\D)(?:19|20)\d{2}(?:\D|$)",
    r"\bFY\s?'?\d{2,4}\b",
    r"\bQ[1-4]\b",
    r"\bH[12]\b",
    r"\b(?:january|february|march|april|may|june|july|august|september|october|november|december)\b",
    r"\b(?:jan|feb|mar|apr|jun|jul|aug|sep|sept|oct|nov|dec)\b",
    r"\b(?:year|years|yr|quarter|quarterly|month|monthly|period|ytd|mtd|annual|semester|half[- ]year|fiscal)\b",
];

const ENTITY_PATTERNS: &[&str] = &[
    r"\b(?:portugal|spain|tunisia|lebanon|egypt|morocco|algeria|brazil|argentina|mexico|france|germany|italy|netherlands|belgium|switzerland|austria|poland|greece|turkey|cyprus|india|china|japan|korea|indonesia|vietnam|australia|canada|usa|united states|united kingdom|uk|ireland|south africa|nigeria|kenya|cape verde|mozambique|angola|senegal|saudi arabia|uae|qatar)\b",
    r"\b(?:europe|emea|americas|north america|latin america|asia|apac|africa|middle east|iberia|domestic|international|global|consolidated)\b",
    r"\b(?:group|company|plant|plants|site|sites|segment|segments|division|subsidiary|subsidiaries|business unit|region|country|entity|facility|factory|mill|holding)\b",
];

const METRIC_PATTERNS: &[&str] = &[
    r"\b(?:revenue|revenues|sales|turnover|ebitda|ebit|income|profit|loss|losses|earnings|eps|dividends?|margins?)\b",
    r"\b(?:cost|costs|expense|expenses|opex|capex|price|prices|depreciation|amortization|interest|tax|taxes)\b",
    r"\b(?:assets|liabilities|equity|cash|debt|working capital|inventories|receivables|payables)\b",
    r"\b(?:volume|volumes|production|capacity|output|consumption|energy|emissions|co2|headcount|employees|fte|utilization|yield|ratio|rate)\b",
    r"\b(?:total|net|gross|operating|variable|fixed|adjusted|average)\b",
];

const UNIT_PATTERNS: &[&str] = &[
    r"^[(\[]?\s*(?:[€$£¥]|eur|usd|gbp|chf|brl|tnd|egp|lbp|mzn|cve|k€|m€|€k|€m|\$k|\$m|keur|meur|musd|mio\.?\s*(?:eur|usd)|(?:eur|usd)\s*(?:k|m|mn|'000))(?:\s*/\s*[a-z0-9²³]+)?\s*[)\]]?$",
    r"^[(\[]?\s*(?:%|pp|p\.p\.|bps)\s*[)\]]?$",
    r"^[(\[]?\s*(?:t|kt|mt|ton|tons|tonne|tonnes|kg|gj|mj|tj|kwh|mwh|gwh|twh|kcal|m3|m2|m²|m³|l|hl|km|h|hours?|days?)(?:\s*/\s*[a-z0-9²³]+)?\s*[)\]]?$",
    r"^[(\[]?\s*(?:kg|t|kt|mt)?\s*co2(?:e|eq)?(?:\s*/\s*[a-z0-9²³]+)?\s*[)\]]?$",
    r"^[(\[]?\s*(?:#|nr\.?|no\.|units?|fte)\s*[)\]]?$",
];

const EXTENDED_UNIT_PATTERNS: &[&str] = &[
    r"\b(?:million|millions|mn|thousand|thousands|billion|billions|bn)\b",
    r"\b(?:percentage|percent|per cent)\b",
    r"\b(?:fte|headcount|units)\b",
    r"\b(?:tonnes?|tons?|kilograms?|gigajoules?|megawatt[- ]?hours?)\b",
    r"\b(?:euros?|dollars?|pounds sterling)\b",
];

const PERIOD_TOKEN_PATTERNS: &[&str] = &[
    r"\bFY\s?'?(?:19|20)?\d{2}\b",
    r"\b[QH][1-4]\s*(?:19|20)\d{2}\b",
    r"\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)[-\s']\d{2,4}\b",
    r"\b(?:19|20)\d{2}(?:\s*[-/]\s*\d{2,4})?\b",
];

fn owned(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|pattern| (*pattern).to_string()).collect()
}

/// Pattern sources per category. Every list may be overridden independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub temporal: Vec<String>,
    pub entity: Vec<String>,
    pub metric: Vec<String>,
    /// Whole-cell unit tokens such as `EUR/t`, `%`, `GJ`.
    pub unit: Vec<String>,
    /// Verbal unit words used by the last unit-inference tier.
    pub extended_unit: Vec<String>,
    /// Concrete period tokens lifted out of captions and page context.
    pub period_token: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            temporal: owned(TEMPORAL_PATTERNS),
            entity: owned(ENTITY_PATTERNS),
            metric: owned(METRIC_PATTERNS),
            unit: owned(UNIT_PATTERNS),
            extended_unit: owned(EXTENDED_UNIT_PATTERNS),
            period_token: owned(PERIOD_TOKEN_PATTERNS),
        }
    }
}

/// One compiled category: a set for counting plus the individual regexes for
/// locating the matched text.
#[derive(Debug, Clone)]
pub struct CategoryPatterns {
    set: RegexSet,
    each: Vec<Regex>,
}

impl CategoryPatterns {
    fn compile(category: &'static str, sources: &[String]) -> Result<Self, ExtractError> {
        let set = RegexSetBuilder::new(sources)
            .case_insensitive(true)
            .build()
            .map_err(|source| ExtractError::Pattern { category, source })?;
        let each = sources
            .iter()
            .map(|source| {
                RegexBuilder::new(source)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ExtractError::Pattern { category, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { set, each })
    }

    /// Number of patterns in the category that match `text`.
    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        self.set.matches(text).iter().count()
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.set.is_match(text)
    }

    /// `text` with every match cut out and whitespace collapsed.
    #[must_use]
    pub fn remove(&self, text: &str) -> String {
        let mut remaining = text.to_string();
        for regex in &self.each {
            remaining = regex.replace_all(&remaining, " ").into_owned();
        }
        remaining.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Leftmost match across all patterns; the longest wins at equal offsets.
    #[must_use]
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.each
            .iter()
            .filter_map(|regex| regex.find(text))
            .min_by_key(|found| (found.start(), std::cmp::Reverse(found.end())))
            .map(|found| found.as_str().trim())
    }
}

#[derive(Debug, Clone)]
pub struct Patterns {
    pub temporal: CategoryPatterns,
    pub entity: CategoryPatterns,
    pub metric: CategoryPatterns,
    pub unit: CategoryPatterns,
    pub extended_unit: CategoryPatterns,
    pub period_token: CategoryPatterns,
}

impl Patterns {
    /// Compiles every category.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Pattern`] naming the first category holding an
    /// invalid regex.
    pub fn compile(config: &PatternConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            temporal: CategoryPatterns::compile("temporal", &config.temporal)?,
            entity: CategoryPatterns::compile("entity", &config.entity)?,
            metric: CategoryPatterns::compile("metric", &config.metric)?,
            unit: CategoryPatterns::compile("unit", &config.unit)?,
            extended_unit: CategoryPatterns::compile("extended_unit", &config.extended_unit)?,
            period_token: CategoryPatterns::compile("period_token", &config.period_token)?,
        })
    }

    /// Whether the whole cell text is a unit token.
    #[must_use]
    pub fn is_unit_token(&self, text: &str) -> bool {
        let trimmed = text.trim();
        !trimmed.is_empty() && self.unit.is_match(trimmed)
    }
}

//! Fills dimensions a table leaves open from its caption and the surrounding
//! page text.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::header::{HeaderClassifier, HeaderType};
use crate::model::PageContext;
use crate::patterns::Patterns;

/// Nearby text blocks consulted, in reading order.
pub const MAX_NEARBY_TEXTS: usize = 5;

static SECTION_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d{1,2}(?:\.\d{1,2})*\.?|[IVXLC]+\.|[a-z]\))\s+")
        .expect("hardcoded section number regex is valid")
});

/// The three dimensions of a fact, any of which may still be open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dimensions {
    pub entity: Option<String>,
    pub metric: Option<String>,
    pub period: Option<String>,
}

impl Dimensions {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entity.is_some() && self.metric.is_some() && self.period.is_some()
    }
}

/// Candidate values lifted from free text. Same shape as [`Dimensions`] but
/// kept apart so a hint is never mistaken for a value read from the grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextHints {
    pub entity: Option<String>,
    pub metric: Option<String>,
    pub period: Option<String>,
}

impl ContextHints {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entity.is_none() && self.metric.is_none() && self.period.is_none()
    }

    /// Field-wise preference for `self`, falling back to `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            entity: self.entity.or(other.entity),
            metric: self.metric.or(other.metric),
            period: self.period.or(other.period),
        }
    }

    /// Copies hints into the open fields of `dimensions`; returns how many
    /// fields were filled.
    pub fn fill(&self, dimensions: &mut Dimensions) -> usize {
        let mut filled = 0;
        for (slot, hint) in [
            (&mut dimensions.entity, &self.entity),
            (&mut dimensions.metric, &self.metric),
            (&mut dimensions.period, &self.period),
        ] {
            if slot.is_none() && hint.is_some() {
                slot.clone_from(hint);
                filled += 1;
            }
        }
        filled
    }
}

#[derive(Debug, Clone)]
pub struct ContextualInferenceFallback {
    patterns: Arc<Patterns>,
    classifier: HeaderClassifier,
}

impl ContextualInferenceFallback {
    #[must_use]
    pub fn new(patterns: Arc<Patterns>) -> Self {
        Self {
            classifier: HeaderClassifier::new(Arc::clone(&patterns)),
            patterns,
        }
    }

    /// Scans `texts` in order; each dimension takes the first text that
    /// yields it.
    pub fn hints_from_texts<'t>(&self, texts: impl IntoIterator<Item = &'t str>) -> ContextHints {
        let mut hints = ContextHints::default();
        for text in texts.into_iter().map(str::trim).filter(|text| !text.is_empty()) {
            let stripped = strip_section_number(text);
            match self.subject_of(stripped) {
                HeaderType::Entity if hints.entity.is_none() => {
                    hints.entity = self.patterns.entity.find(stripped).map(str::to_string);
                }
                HeaderType::Metric if hints.metric.is_none() => {
                    hints.metric = self.metric_phrase(stripped);
                }
                _ => {}
            }
            if hints.period.is_none() {
                hints.period = self.patterns.period_token.find(text).map(str::to_string);
            }
        }
        hints
    }

    /// Header classification without the temporal override: free text such
    /// as "Energy costs 2024" names a metric even though it carries a year.
    fn subject_of(&self, text: &str) -> HeaderType {
        let counts = self.classifier.counts(text);
        if counts.metric > counts.entity {
            HeaderType::Metric
        } else if counts.entity > 0 {
            HeaderType::Entity
        } else {
            HeaderType::Unknown
        }
    }

    /// The text minus its period tokens, e.g. `"Energy costs"` out of
    /// `"Energy costs FY2024"`.
    fn metric_phrase(&self, text: &str) -> Option<String> {
        let phrase = self.patterns.period_token.remove(text);
        let phrase = phrase.trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-' | '/' | '(' | ')' | '[' | ']')
        });
        (!phrase.is_empty()).then(|| phrase.to_string())
    }

    /// Hints carried by a table caption, e.g. `"Energy costs FY2024"`.
    #[must_use]
    pub fn caption_hints(&self, caption: &str) -> ContextHints {
        self.hints_from_texts([caption])
    }

    /// Section heading, then the first nearby texts, then the page title.
    #[must_use]
    pub fn page_hints(&self, context: &PageContext) -> ContextHints {
        let texts = context
            .section_heading
            .as_deref()
            .into_iter()
            .chain(context.nearby_text.iter().take(MAX_NEARBY_TEXTS).map(String::as_str))
            .chain(context.page_title.as_deref());
        self.hints_from_texts(texts)
    }

    /// Caption hints take precedence over page context.
    #[must_use]
    pub fn hints(&self, caption: Option<&str>, context: Option<&PageContext>) -> ContextHints {
        let from_caption = caption.map(|caption| self.caption_hints(caption)).unwrap_or_default();
        let from_page = context.map(|context| self.page_hints(context)).unwrap_or_default();
        from_caption.or(from_page)
    }
}

fn strip_section_number(text: &str) -> &str {
    SECTION_NUMBER_RE
        .find(text)
        .map_or(text, |found| &text[found.end()..])
        .trim()
}

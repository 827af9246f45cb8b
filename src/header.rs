use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::Serialize;

use crate::patterns::Patterns;

/// What a header cell describes. Declaration order is the tie-break order
/// for every vote over header types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeaderType {
    Temporal,
    Entity,
    Metric,
    Unknown,
}

impl HeaderType {
    pub const ALL: [Self; 4] = [Self::Temporal, Self::Entity, Self::Metric, Self::Unknown];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Temporal => "TEMPORAL",
            Self::Entity => "ENTITY",
            Self::Metric => "METRIC",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl Display for HeaderType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category pattern hit counts for one header text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub temporal: usize,
    pub entity: usize,
    pub metric: usize,
}

#[derive(Debug, Clone)]
pub struct HeaderClassifier {
    patterns: Arc<Patterns>,
}

impl HeaderClassifier {
    #[must_use]
    pub fn new(patterns: Arc<Patterns>) -> Self {
        Self { patterns }
    }

    #[must_use]
    pub fn counts(&self, text: &str) -> CategoryCounts {
        CategoryCounts {
            temporal: self.patterns.temporal.count(text),
            entity: self.patterns.entity.count(text),
            metric: self.patterns.metric.count(text),
        }
    }

    /// Classifies one header text.
    ///
    /// Temporal hits win outright; otherwise metric must out-count entity to
    /// win, and any entity hit beats Unknown.
    #[must_use]
    pub fn classify(&self, text: &str) -> HeaderType {
        let text = text.trim();
        if text.is_empty() {
            return HeaderType::Unknown;
        }

        let counts = self.counts(text);
        if counts.temporal > 0 {
            HeaderType::Temporal
        } else if counts.metric > counts.entity {
            HeaderType::Metric
        } else if counts.entity > 0 {
            HeaderType::Entity
        } else {
            HeaderType::Unknown
        }
    }

    /// Majority type over non-empty texts, ignoring Unknown votes. Ties go to
    /// the earlier [`HeaderType`] variant; no votes yields Unknown.
    pub fn dominant<'t>(&self, texts: impl IntoIterator<Item = &'t str>) -> HeaderType {
        dominant_of(texts.into_iter().map(|text| self.classify(text)))
    }

    /// Fraction of non-empty texts classified as `target`.
    pub fn fraction<'t>(&self, texts: impl IntoIterator<Item = &'t str>, target: HeaderType) -> f64 {
        let mut total = 0_usize;
        let mut hits = 0_usize;
        for text in texts.into_iter().map(str::trim).filter(|text| !text.is_empty()) {
            total += 1;
            if self.classify(text) == target {
                hits += 1;
            }
        }
        ratio(hits, total)
    }
}

pub(crate) fn dominant_of(types: impl IntoIterator<Item = HeaderType>) -> HeaderType {
    let mut votes = [0_usize; 4];
    for header_type in types {
        votes[header_type as usize] += 1;
    }

    HeaderType::ALL
        .into_iter()
        .filter(|header_type| *header_type != HeaderType::Unknown)
        .fold((HeaderType::Unknown, 0), |best, candidate| {
            let count = votes[candidate as usize];
            if count > best.1 { (candidate, count) } else { best }
        })
        .0
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

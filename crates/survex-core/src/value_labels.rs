//! Deduplicated value→label dictionaries shared across coded columns.

use survex_model::SurveyId;

/// One coded value and its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueLabelPair {
    pub value: String,
    pub label: String,
}

impl ValueLabelPair {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A tagged, ordered list of value/label pairs. Two sets are equivalent
/// when they hold the same pairs regardless of order.
#[derive(Debug, Clone)]
pub struct ValueLabelSet {
    pub tag: String,
    pub pairs: Vec<ValueLabelPair>,
}

impl ValueLabelSet {
    /// Order-independent pair-set equality.
    pub fn is_equivalent(&self, pairs: &[ValueLabelPair]) -> bool {
        self.pairs.len() == pairs.len()
            && self.pairs.iter().all(|pair| pairs.contains(pair))
            && pairs.iter().all(|pair| self.pairs.contains(pair))
    }
}

/// Registry of value-label sets for one output file.
///
/// Tags are `VL_<survey>_<scope>_<index>` with a dense index: interning a
/// set equivalent to an existing one returns the existing tag without
/// consuming an index.
#[derive(Debug)]
pub struct ValueLabelRegistry {
    prefix: String,
    next_index: usize,
    sets: Vec<ValueLabelSet>,
}

impl ValueLabelRegistry {
    /// `scope` is the section id for section files, the file name otherwise.
    pub fn new(survey: SurveyId, scope: &str) -> Self {
        Self {
            prefix: format!("VL_{survey}_{scope}"),
            next_index: 0,
            sets: Vec::new(),
        }
    }

    /// Register a candidate set, reusing the tag of an equivalent one.
    pub fn intern(&mut self, pairs: Vec<ValueLabelPair>) -> String {
        if let Some(existing) = self.sets.iter().find(|set| set.is_equivalent(&pairs)) {
            return existing.tag.clone();
        }
        let tag = format!("{}_{}", self.prefix, self.next_index);
        self.next_index += 1;
        self.sets.push(ValueLabelSet {
            tag: tag.clone(),
            pairs,
        });
        tag
    }

    /// Registered sets in first-seen order.
    pub fn sets(&self) -> &[ValueLabelSet] {
        &self.sets
    }
}

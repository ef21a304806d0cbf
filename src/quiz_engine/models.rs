use std::fmt;
use serde::{Deserialize, Serialize};

/// Name of a question pool, e.g. `"domain3"`.
pub type DomainKey = String;

// ---------------------------------------------------------------------------
// Question primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub correct: bool,
}

impl Answer {
    pub fn new(text: impl Into<String>, correct: bool) -> Self {
        Answer { text: text.into(), correct }
    }
}

/// One multiple-choice question. Answers keep the order they were authored in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question", alias = "text")]
    pub text: String,
    pub answers: Vec<Answer>,
}

impl Question {
    pub fn new(text: impl Into<String>, answers: Vec<Answer>) -> Self {
        Question { text: text.into(), answers }
    }

    /// Indices of every answer flagged correct.
    pub fn correct_indices(&self) -> Vec<usize> {
        self.answers
            .iter()
            .enumerate()
            .filter(|(_, a)| a.correct)
            .map(|(i, _)| i)
            .collect()
    }

    /// A question is usable only if at least one answer is correct.
    pub fn is_well_formed(&self) -> bool {
        self.answers.iter().any(|a| a.correct)
    }
}

/// A question annotated with the pool it was drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedQuestion {
    #[serde(flatten)]
    pub question: Question,
    #[serde(rename = "__domain", default = "unknown_domain")]
    pub domain: DomainKey,
}

fn unknown_domain() -> DomainKey {
    "unknown".to_string()
}

impl TaggedQuestion {
    pub fn new(question: Question, domain: impl Into<DomainKey>) -> Self {
        TaggedQuestion { question, domain: domain.into() }
    }
}

// ---------------------------------------------------------------------------
// Pools and allocation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub key: DomainKey,
    pub questions: Vec<Question>,
}

impl Pool {
    pub fn new(key: impl Into<DomainKey>, questions: Vec<Question>) -> Self {
        Pool { key: key.into(), questions }
    }

    pub fn empty(key: impl Into<DomainKey>) -> Self {
        Pool::new(key, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn capacity(&self) -> PoolSize {
        PoolSize { key: self.key.clone(), size: self.len() }
    }
}

/// How many questions a pool can contribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSize {
    pub key: DomainKey,
    pub size: usize,
}

impl PoolSize {
    pub fn new(key: impl Into<DomainKey>, size: usize) -> Self {
        PoolSize { key: key.into(), size }
    }
}

/// Integer count per domain, in the order the domains were considered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    entries: Vec<(DomainKey, usize)>,
}

impl Allocation {
    pub fn new() -> Self {
        Allocation::default()
    }

    /// Set the count for `key`, replacing any earlier count for the same key.
    pub fn set(&mut self, key: impl Into<DomainKey>, count: usize) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = count,
            None => self.entries.push((key, count)),
        }
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, n)| *n)
    }

    /// Sum of all counts, saturating at `usize::MAX`.
    pub fn total(&self) -> usize {
        self.entries.iter().fold(0usize, |acc, (_, n)| acc.saturating_add(*n))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, n)| (k.as_str(), *n))
    }
}

impl FromIterator<(DomainKey, usize)> for Allocation {
    fn from_iter<I: IntoIterator<Item = (DomainKey, usize)>>(iter: I) -> Self {
        let mut alloc = Allocation::new();
        for (key, count) in iter {
            alloc.set(key, count);
        }
        alloc
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.entries.iter().map(|(k, n)| format!("{k}={n}")).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Quiz requests
// ---------------------------------------------------------------------------

/// Which policy distributes a total count across pools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStrategy {
    /// Proportional floor, shortfall handed out in declaration order.
    #[default]
    RoundRobin,
    /// Proportional floor, shortfall handed to the largest fractional remainders.
    LargestRemainder,
}

impl fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationStrategy::RoundRobin       => write!(f, "round-robin"),
            AllocationStrategy::LargestRemainder => write!(f, "largest-remainder"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizRequest {
    /// Draw up to `count` questions from each listed domain.
    PerPoolCounts(Vec<(DomainKey, usize)>),
    /// Draw `total_count` questions spread over the selected domains
    /// (all known domains when the selection is empty).
    Total {
        total_count: usize,
        selected_domains: Vec<DomainKey>,
    },
    /// Draw `total` questions split by percentage-style weights.
    Weighted {
        total: usize,
        weights: Vec<(DomainKey, f64)>,
    },
}

impl QuizRequest {
    pub fn per_pool<K: Into<DomainKey>>(counts: impl IntoIterator<Item = (K, usize)>) -> Self {
        QuizRequest::PerPoolCounts(counts.into_iter().map(|(k, n)| (k.into(), n)).collect())
    }

    pub fn total<K: Into<DomainKey>>(total_count: usize, selected: impl IntoIterator<Item = K>) -> Self {
        QuizRequest::Total {
            total_count,
            selected_domains: selected.into_iter().map(Into::into).collect(),
        }
    }

    pub fn weighted<K: Into<DomainKey>>(total: usize, weights: impl IntoIterator<Item = (K, f64)>) -> Self {
        QuizRequest::Weighted {
            total,
            weights: weights.into_iter().map(|(k, w)| (k.into(), w)).collect(),
        }
    }
}

/// Per-domain count of the questions in a finished or saved quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTally {
    pub domain: DomainKey,
    pub count: usize,
}

/// Tally questions by domain, in order of first appearance.
pub fn domain_breakdown(questions: &[TaggedQuestion]) -> Vec<DomainTally> {
    let mut tallies: Vec<DomainTally> = Vec::new();
    for q in questions {
        match tallies.iter_mut().find(|t| t.domain == q.domain) {
            Some(t) => t.count += 1,
            None => tallies.push(DomainTally { domain: q.domain.clone(), count: 1 }),
        }
    }
    tallies
}

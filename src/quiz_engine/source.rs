//! Where question pools come from.
//!
//! Every backend implements [`PoolSource`], so the assembler runs one algorithm
//! regardless of how the questions are stored:
//!
//! | Backend | Storage |
//! |---------|---------|
//! | [`InlineSource`] | pools bundled in memory |
//! | [`AggregatedFileSource`] | one JSON object mapping domain key → question array |
//! | [`PerDomainFileSource`] | one `<key>.json` file per domain |

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::quiz_engine::{
    error::{QuizError, Result},
    models::{DomainKey, Pool, Question},
};

#[async_trait]
pub trait PoolSource: Send + Sync {
    /// The full domain set, used when a request selects none.
    async fn domains(&self) -> Result<Vec<DomainKey>>;

    /// Load one pool. Errors are reported, the assembler decides what to do.
    async fn fetch(&self, domain: &str) -> Result<Vec<Question>>;
}

#[async_trait]
impl<T: PoolSource + ?Sized> PoolSource for Box<T> {
    async fn domains(&self) -> Result<Vec<DomainKey>> {
        (**self).domains().await
    }

    async fn fetch(&self, domain: &str) -> Result<Vec<Question>> {
        (**self).fetch(domain).await
    }
}

/// Parse a pool document.
///
/// Accepts either a bare array of questions or an object holding the array
/// under the domain key. Questions without a correct answer are dropped.
pub fn parse_pool(domain: &str, raw: &str) -> Result<Vec<Question>> {
    let doc: Value = serde_json::from_str(raw).map_err(|e| unavailable(domain, e))?;
    let array = match doc {
        Value::Array(_) => doc,
        Value::Object(mut map) => map
            .remove(domain)
            .filter(Value::is_array)
            .ok_or_else(|| unavailable(domain, "no question array under the domain key"))?,
        _ => return Err(unavailable(domain, "expected an array or an object")),
    };
    let questions: Vec<Question> = serde_json::from_value(array).map_err(|e| unavailable(domain, e))?;
    Ok(keep_well_formed(domain, questions))
}

fn keep_well_formed(domain: &str, questions: Vec<Question>) -> Vec<Question> {
    let before = questions.len();
    let kept: Vec<Question> = questions.into_iter().filter(Question::is_well_formed).collect();
    if kept.len() < before {
        warn!(domain, dropped = before - kept.len(), "dropping questions without a correct answer");
    }
    kept
}

fn unavailable(domain: &str, reason: impl ToString) -> QuizError {
    QuizError::DataUnavailable {
        domain: domain.to_string(),
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Inline pools
// ---------------------------------------------------------------------------

/// Pools compiled into the program or built by the caller.
#[derive(Debug, Clone, Default)]
pub struct InlineSource {
    pools: Vec<Pool>,
}

impl InlineSource {
    pub fn new(pools: Vec<Pool>) -> Self {
        InlineSource { pools }
    }
}

#[async_trait]
impl PoolSource for InlineSource {
    async fn domains(&self) -> Result<Vec<DomainKey>> {
        Ok(self.pools.iter().map(|p| p.key.clone()).collect())
    }

    async fn fetch(&self, domain: &str) -> Result<Vec<Question>> {
        self.pools
            .iter()
            .find(|p| p.key == domain)
            .map(|p| keep_well_formed(domain, p.questions.clone()))
            .ok_or_else(|| unavailable(domain, "unknown domain"))
    }
}

// ---------------------------------------------------------------------------
// One aggregated document
// ---------------------------------------------------------------------------

/// A single JSON document such as `data/domains.json`:
/// `{ "domain1": [ ... ], "domain2": [ ... ] }`.
///
/// The document is read and parsed once, on first use; later calls share the
/// parsed map. A failed read is not cached.
#[derive(Debug, Clone)]
pub struct AggregatedFileSource {
    path: PathBuf,
    document: OnceCell<Map<String, Value>>,
}

impl AggregatedFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AggregatedFileSource { path: path.into(), document: OnceCell::new() }
    }

    async fn document(&self) -> Result<&Map<String, Value>> {
        self.document.get_or_try_init(|| self.read_document()).await
    }

    async fn read_document(&self) -> Result<Map<String, Value>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            unavailable("*", format!("{}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), "reading aggregated pool document");
        match serde_json::from_str(&raw).map_err(|e| unavailable("*", e))? {
            Value::Object(map) => Ok(map),
            _ => Err(unavailable("*", "aggregated document must be a JSON object")),
        }
    }
}

#[async_trait]
impl PoolSource for AggregatedFileSource {
    async fn domains(&self) -> Result<Vec<DomainKey>> {
        Ok(self.document().await?.keys().cloned().collect())
    }

    async fn fetch(&self, domain: &str) -> Result<Vec<Question>> {
        let array = self
            .document()
            .await?
            .get(domain)
            .cloned()
            .ok_or_else(|| unavailable(domain, "unknown domain"))?;
        let questions: Vec<Question> = serde_json::from_value(array).map_err(|e| unavailable(domain, e))?;
        Ok(keep_well_formed(domain, questions))
    }
}

// ---------------------------------------------------------------------------
// One file per domain
// ---------------------------------------------------------------------------

/// `<dir>/<key>.json` for each configured key.
#[derive(Debug, Clone)]
pub struct PerDomainFileSource {
    dir: PathBuf,
    keys: Vec<DomainKey>,
}

impl PerDomainFileSource {
    pub fn new(dir: impl Into<PathBuf>, keys: Vec<DomainKey>) -> Self {
        PerDomainFileSource { dir: dir.into(), keys }
    }

    /// `domain1 ..= domain<count>`, the layout the bundled data uses.
    pub fn numbered(dir: impl Into<PathBuf>, count: usize) -> Self {
        let keys = (1..=count).map(|i| format!("domain{i}")).collect();
        PerDomainFileSource::new(dir, keys)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, domain: &str) -> PathBuf {
        self.dir.join(format!("{domain}.json"))
    }
}

#[async_trait]
impl PoolSource for PerDomainFileSource {
    async fn domains(&self) -> Result<Vec<DomainKey>> {
        Ok(self.keys.clone())
    }

    async fn fetch(&self, domain: &str) -> Result<Vec<Question>> {
        let path = self.path_for(domain);
        debug!(path = %path.display(), "loading pool file");
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| unavailable(domain, format!("{}: {e}", path.display())))?;
        parse_pool(domain, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz_engine::models::Answer;

    const POOL_JSON: &str = r#"[
        { "question": "First?",  "answers": [ { "text": "yes", "correct": true },  { "text": "no", "correct": false } ] },
        { "question": "Second?", "answers": [ { "text": "a",   "correct": false }, { "text": "b",  "correct": true } ] }
    ]"#;

    #[test]
    fn parse_pool_accepts_bare_array() {
        let qs = parse_pool("domain1", POOL_JSON).unwrap();
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].text, "First?");
        assert_eq!(qs[1].correct_indices(), vec![1]);
    }

    #[test]
    fn parse_pool_accepts_object_keyed_by_domain() {
        let raw = format!(r#"{{ "domain2": {POOL_JSON} }}"#);
        assert_eq!(parse_pool("domain2", &raw).unwrap().len(), 2);
        assert!(matches!(
            parse_pool("domain3", &raw),
            Err(QuizError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn parse_pool_rejects_garbage() {
        assert!(parse_pool("d", "not json").is_err());
        assert!(parse_pool("d", "42").is_err());
        assert!(parse_pool("d", r#"[{"nope": 1}]"#).is_err());
    }

    #[test]
    fn parse_pool_drops_questions_without_correct_answer() {
        let raw = r#"[
            { "question": "ok",     "answers": [ { "text": "x", "correct": true } ] },
            { "question": "broken", "answers": [ { "text": "x", "correct": false } ] },
            { "question": "empty",  "answers": [] }
        ]"#;
        let qs = parse_pool("d", raw).unwrap();
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].text, "ok");
    }

    #[tokio::test]
    async fn inline_source_serves_known_domains() {
        let source = InlineSource::new(vec![Pool::new(
            "domain1",
            vec![Question::new("q", vec![Answer::new("a", true)])],
        )]);
        assert_eq!(source.domains().await.unwrap(), vec!["domain1".to_string()]);
        assert_eq!(source.fetch("domain1").await.unwrap().len(), 1);
        assert!(source.fetch("domain2").await.is_err());
    }

    #[tokio::test]
    async fn per_domain_files_load_independently() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("domain1.json"), POOL_JSON).unwrap();
        std::fs::write(dir.path().join("domain2.json"), "{ broken").unwrap();

        let source = PerDomainFileSource::numbered(dir.path(), 3);
        assert_eq!(source.domains().await.unwrap().len(), 3);
        assert_eq!(source.fetch("domain1").await.unwrap().len(), 2);
        assert!(source.fetch("domain2").await.is_err(), "malformed file");
        assert!(source.fetch("domain3").await.is_err(), "missing file");
    }

    #[tokio::test]
    async fn aggregated_file_lists_and_serves_domains() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domains.json");
        std::fs::write(&path, format!(r#"{{ "domain1": {POOL_JSON}, "domain2": [] }}"#)).unwrap();

        let source = AggregatedFileSource::new(&path);
        assert_eq!(source.domains().await.unwrap(), vec!["domain1", "domain2"]);
        assert_eq!(source.fetch("domain1").await.unwrap().len(), 2);
        assert!(source.fetch("domain2").await.unwrap().is_empty());
        assert!(source.fetch("domain9").await.is_err());
    }

    #[tokio::test]
    async fn aggregated_file_is_parsed_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domains.json");
        std::fs::write(&path, format!(r#"{{ "domain1": {POOL_JSON} }}"#)).unwrap();

        let source = AggregatedFileSource::new(&path);
        assert_eq!(source.domains().await.unwrap(), vec!["domain1"]);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(source.fetch("domain1").await.unwrap().len(), 2, "served from the parsed document");
    }

    #[tokio::test]
    async fn aggregated_file_missing_is_unavailable() {
        let source = AggregatedFileSource::new("/definitely/not/here/domains.json");
        assert!(matches!(
            source.domains().await,
            Err(QuizError::DataUnavailable { .. })
        ));
    }
}

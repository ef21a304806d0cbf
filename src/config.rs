//! Runtime configuration with multi-source merging.
//!
//! Priority (highest to lowest):
//! 1. `QUIZ_*` environment variables, e.g. `QUIZ_EXAM_SECONDS=600`
//! 2. The TOML file passed to [`QuizConfig::load`], if it exists
//! 3. Built-in defaults
//!
//! ```toml
//! exam_seconds = 10800
//! timer_mode = "exam"          # or "per_question"
//! strategy = "round_robin"     # or "largest_remainder"
//! snapshot_path = "last_quiz.json"
//!
//! [source]
//! kind = "per_domain"
//! dir = "data"
//! ```

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::quiz_engine::{
    error::Result,
    models::{AllocationStrategy, DomainKey, Pool},
    sampler::quiz_rng,
    session::{SessionConfig, TimerMode, DEFAULT_SECONDS_PER_QUESTION, EXAM_TOTAL_SECONDS},
    source::{AggregatedFileSource, InlineSource, PerDomainFileSource, PoolSource},
    store::JsonFileStore,
};

/// Number of per-domain files the bundled data ships with.
const DEFAULT_DOMAIN_COUNT: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Pools are supplied by the caller.
    #[default]
    Inline,
    Aggregated { path: PathBuf },
    PerDomain {
        dir: PathBuf,
        /// Empty means `domain1..domain7`.
        #[serde(default)]
        domains: Vec<DomainKey>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub exam_seconds: u64,
    pub question_seconds: u64,
    pub timer_mode: TimerMode,
    pub strategy: AllocationStrategy,
    pub rng_seed: Option<u64>,
    pub snapshot_path: PathBuf,
    pub source: SourceConfig,
}

impl Default for QuizConfig {
    fn default() -> Self {
        QuizConfig {
            exam_seconds: EXAM_TOTAL_SECONDS,
            question_seconds: DEFAULT_SECONDS_PER_QUESTION,
            timer_mode: TimerMode::Exam,
            strategy: AllocationStrategy::RoundRobin,
            rng_seed: None,
            snapshot_path: PathBuf::from("last_quiz.json"),
            source: SourceConfig::Inline,
        }
    }
}

impl QuizConfig {
    /// The merged provider chain, exposed so callers can layer more on top.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(QuizConfig::default()));
        if let Some(path) = path.filter(|p| p.exists()) {
            debug!(path = %path.display(), "merging config file");
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("QUIZ_"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        Ok(Self::figment(path).extract()?)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            timer_mode: self.timer_mode,
            exam_seconds: self.exam_seconds,
            question_seconds: self.question_seconds,
        }
    }

    pub fn rng(&self) -> StdRng {
        quiz_rng(self.rng_seed)
    }

    pub fn snapshot_store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.snapshot_path)
    }

    /// `inline` is only used by [`SourceConfig::Inline`].
    pub fn build_source(&self, inline: Vec<Pool>) -> Box<dyn PoolSource> {
        match &self.source {
            SourceConfig::Inline => Box::new(InlineSource::new(inline)),
            SourceConfig::Aggregated { path } => Box::new(AggregatedFileSource::new(path)),
            SourceConfig::PerDomain { dir, domains } if domains.is_empty() => {
                Box::new(PerDomainFileSource::numbered(dir, DEFAULT_DOMAIN_COUNT))
            }
            SourceConfig::PerDomain { dir, domains } => {
                Box::new(PerDomainFileSource::new(dir, domains.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_exam_format() {
        let config = QuizConfig::default();
        assert_eq!(config.exam_seconds, 10_800);
        assert_eq!(config.question_seconds, 15);
        assert_eq!(config.session_config(), SessionConfig::default());
        assert_eq!(config.source, SourceConfig::Inline);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = QuizConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.strategy, AllocationStrategy::RoundRobin);
        assert_eq!(config.snapshot_path, PathBuf::from("last_quiz.json"));
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.toml");
        std::fs::write(
            &path,
            r#"
                question_seconds = 30
                timer_mode = "per_question"
                strategy = "largest_remainder"
                rng_seed = 42

                [source]
                kind = "per_domain"
                dir = "data"
            "#,
        )
        .unwrap();

        let config = QuizConfig::load(Some(&path)).unwrap();
        assert_eq!(config.question_seconds, 30);
        assert_eq!(config.exam_seconds, 10_800, "untouched fields keep their default");
        assert_eq!(config.timer_mode, TimerMode::PerQuestion);
        assert_eq!(config.strategy, AllocationStrategy::LargestRemainder);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(
            config.source,
            SourceConfig::PerDomain { dir: PathBuf::from("data"), domains: Vec::new() }
        );
    }

    #[test]
    fn layered_string_provider_wins() {
        let config: QuizConfig = Figment::new()
            .merge(Serialized::defaults(QuizConfig::default()))
            .merge(Toml::string(r#"exam_seconds = 60"#))
            .extract()
            .unwrap();
        assert_eq!(config.session_config().exam_seconds, 60);
    }

    #[tokio::test]
    async fn per_domain_source_defaults_to_numbered_keys() {
        let config = QuizConfig {
            source: SourceConfig::PerDomain { dir: PathBuf::from("data"), domains: Vec::new() },
            ..QuizConfig::default()
        };
        let source = config.build_source(Vec::new());
        let domains = source.domains().await.unwrap();
        assert_eq!(domains.len(), 7);
        assert_eq!(domains[0], "domain1");
        assert_eq!(domains[6], "domain7");
    }
}

//! # quiz_runner
//!
//! Assembles timed multiple-choice exams from domain question pools and runs
//! them as a resumable session.
//!
//! ## How it works
//!
//! 1. Describe the quiz with a [`QuizRequest`]: explicit per-pool counts, a
//!    total spread over selected domains, or a total split by weights.
//! 2. [`QuizAssembler::assemble`] loads every pool from a [`PoolSource`],
//!    allocates counts (round-robin or largest-remainder), samples without
//!    replacement, tags each question with its domain and shuffles the result.
//! 3. A [`QuizSession`] runs the quiz: it presents questions, scores the first
//!    answer to each, counts down the exam (or each question) on one-second
//!    ticks, and saves a [`PersistedSnapshot`] on abandon or completion so an
//!    abandoned quiz can be resumed later.
//!
//! ## Key features
//!
//! - **Deterministic**: seed the RNG with [`quiz_rng`]`(Some(seed))` to get the
//!   same quiz every time.
//! - **Degrades instead of failing**: a pool that cannot be loaded counts as
//!   empty; a snapshot that cannot be saved is logged and skipped.
//! - **UI agnostic**: the session emits [`SessionEvent`]s; the `view` module
//!   turns them into JSON view models.
//!
//! ## Quick start
//!
//! ```rust
//! use quiz_runner::{
//!     quiz_rng, Answer, InlineSource, Pool, Question, QuizAssembler, QuizRequest, QuizSession,
//!     SessionConfig,
//! };
//!
//! let q = |text: &str| Question::new(text, vec![Answer::new("yes", true), Answer::new("no", false)]);
//! let source = InlineSource::new(vec![
//!     Pool::new("domain1", vec![q("a"), q("b"), q("c")]),
//!     Pool::new("domain2", vec![q("d")]),
//! ]);
//!
//! let mut rng = quiz_rng(Some(42));
//! let quiz = futures::executor::block_on(
//!     QuizAssembler::new(source).assemble(&QuizRequest::total(2, Vec::<String>::new()), &mut rng),
//! )
//! .unwrap();
//! assert_eq!(quiz.len(), 2);
//!
//! let mut session = QuizSession::new(SessionConfig::default());
//! session.start(quiz).unwrap();
//! session.select_answer(0).unwrap();
//! session.advance();
//! println!("score so far: {}", session.score());
//! ```

pub mod config;
pub mod quiz_engine;

// Convenience re-exports so callers can use `quiz_runner::QuizSession`
// directly without reaching into `quiz_engine::`.
pub use config::{QuizConfig, SourceConfig};
pub use quiz_engine::{
    quiz_rng, run_session, Allocation, AllocationStrategy, Answer, DomainKey, InlineSource,
    PersistedSnapshot, Pool, PoolSource, Question, QuizAssembler, QuizError, QuizRequest,
    QuizSession, QuizSummary, SessionConfig, SessionEvent, SessionState, TaggedQuestion,
    TimerMode, UserAction,
};

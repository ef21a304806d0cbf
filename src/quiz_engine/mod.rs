//! Quiz engine: pool loading, allocation, sampling, and the timed exam session.
//!
//! ## Module overview
//!
//! | Module       | Purpose |
//! |--------------|---------|
//! | `models`     | Shared types: questions, pools, allocations, quiz requests |
//! | `error`      | `QuizError` and the crate `Result` alias |
//! | `sampler`    | Fisher-Yates shuffle and without-replacement sampling |
//! | `allocation` | Round-robin and largest-remainder distribution of counts over pools |
//! | `source`     | `PoolSource` trait with inline, aggregated-file and per-domain-file backends |
//! | `assembler`  | `QuizAssembler::assemble()`: load, allocate, draw, tag, shuffle |
//! | `timer`      | Tick-driven countdowns and the injectable wall clock |
//! | `store`      | Persisted snapshot of the last quiz and its stores |
//! | `session`    | The exam state machine: start, answer, tick, advance, abandon, resume |
//! | `driver`     | Tokio loop feeding a session its ticks and user actions |
//! | `view`       | JSON view models and timer labels for a UI |

pub mod allocation;
pub mod assembler;
pub mod driver;
pub mod error;
pub mod models;
pub mod sampler;
pub mod session;
pub mod source;
pub mod store;
pub mod timer;
pub mod view;

pub use allocation::{
    allocate_by_weight, allocate_explicit, allocate_round_robin, allocate_total,
    ensure_within_capacity, preview_weighted,
};
pub use assembler::QuizAssembler;
pub use driver::{run_session, UserAction};
pub use error::{QuizError, Result};
pub use models::{
    Allocation, AllocationStrategy, Answer, DomainKey, DomainTally, Pool, PoolSize, Question,
    QuizRequest, TaggedQuestion,
};
pub use sampler::quiz_rng;
pub use session::{QuizSession, QuizSummary, SessionConfig, SessionEvent, SessionState, TimerMode};
pub use source::{AggregatedFileSource, InlineSource, PerDomainFileSource, PoolSource};
pub use store::{load_last_quiz, JsonFileStore, MemoryStore, PersistedSnapshot, SnapshotStore};
pub use timer::{Clock, ManualClock, SystemClock};

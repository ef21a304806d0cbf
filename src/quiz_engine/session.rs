//! The exam session state machine.
//!
//! ```text
//! NotStarted ──start──▶ InProgress ──advance past last──▶ Completed
//!                        │   ▲      ──exam countdown hits 0──▶ TimedOut
//!                 abandon│   │resume
//!                        ▼   │
//!                      Abandoned
//! ```
//!
//! The session never renders anything. Every operation returns the
//! [`SessionEvent`]s it produced and a presentation adapter (see `view`) turns
//! them into whatever the UI needs.
//!
//! Timing is tick driven: the owner calls [`QuizSession::tick`] once per
//! second. Only one timer discipline is active per [`TimerMode`], and each
//! timer occupies a single slot, so starting a timer replaces any running one.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::quiz_engine::{
    error::{QuizError, Result},
    models::{domain_breakdown, DomainKey, DomainTally, Question, TaggedQuestion},
    store::{MemoryStore, PersistedSnapshot, SnapshotStore},
    timer::{Clock, Countdown, SystemClock},
};

/// Three hours.
pub const EXAM_TOTAL_SECONDS: u64 = 3 * 60 * 60;
pub const DEFAULT_SECONDS_PER_QUESTION: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Abandoned,
    Completed,
    TimedOut,
}

impl SessionState {
    pub fn is_finished(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::TimedOut)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::NotStarted => write!(f, "not started"),
            SessionState::InProgress => write!(f, "in progress"),
            SessionState::Abandoned  => write!(f, "abandoned"),
            SessionState::Completed  => write!(f, "completed"),
            SessionState::TimedOut   => write!(f, "timed out"),
        }
    }
}

/// Which countdown drives the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// One countdown for the whole exam; running out ends the session.
    #[default]
    Exam,
    /// A fresh countdown per question; running out reveals the answer.
    PerQuestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub timer_mode: TimerMode,
    pub exam_seconds: u64,
    pub question_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            timer_mode: TimerMode::Exam,
            exam_seconds: EXAM_TOTAL_SECONDS,
            question_seconds: DEFAULT_SECONDS_PER_QUESTION,
        }
    }
}

/// Final result of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub score: usize,
    pub total: usize,
    pub elapsed_seconds: u64,
    pub timed_out: bool,
    pub breakdown: Vec<DomainTally>,
    /// Epoch milliseconds.
    pub finished_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    QuestionPresented {
        /// 1-based.
        number: usize,
        total: usize,
        domain: DomainKey,
        question: Question,
    },
    /// Choices are locked. `selected` is `None` when the question timed out.
    AnswerRevealed {
        selected: Option<usize>,
        was_correct: bool,
        correct: Vec<usize>,
    },
    ExamTick { remaining_seconds: u64 },
    QuestionTick { remaining_seconds: u64 },
    Completed(QuizSummary),
    /// The snapshot was handed to the store; resume is available.
    Abandoned(PersistedSnapshot),
}

pub struct QuizSession {
    config: SessionConfig,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    questions: Vec<TaggedQuestion>,
    current_index: usize,
    score: usize,
    state: SessionState,
    exam_timer: Option<Countdown>,
    question_timer: Option<Countdown>,
    started_at_ms: i64,
    locked: bool,
    selection: Option<usize>,
    summary: Option<QuizSummary>,
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("state", &self.state)
            .field("current_index", &self.current_index)
            .field("score", &self.score)
            .field("total", &self.questions.len())
            .field("exam_timer", &self.exam_timer)
            .field("question_timer", &self.question_timer)
            .finish_non_exhaustive()
    }
}

impl QuizSession {
    pub fn new(config: SessionConfig) -> Self {
        QuizSession {
            config,
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(SystemClock),
            questions: Vec::new(),
            current_index: 0,
            score: 0,
            state: SessionState::NotStarted,
            exam_timer: None,
            question_timer: None,
            started_at_ms: 0,
            locked: false,
            selection: None,
            summary: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ── accessors ────────────────────────────────────────────────────────────

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn questions(&self) -> &[TaggedQuestion] {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&TaggedQuestion> {
        match self.state {
            SessionState::InProgress => self.questions.get(self.current_index),
            _ => None,
        }
    }

    /// Whether the current question's choices are locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn remaining_exam_seconds(&self) -> Option<u64> {
        self.exam_timer.map(|t| t.remaining())
    }

    pub fn remaining_question_seconds(&self) -> Option<u64> {
        self.question_timer.map(|t| t.remaining())
    }

    pub fn summary(&self) -> Option<&QuizSummary> {
        self.summary.as_ref()
    }

    // ── lifecycle ────────────────────────────────────────────────────────────

    /// Start a fresh run over `questions`, superseding whatever ran before.
    pub fn start(&mut self, questions: Vec<TaggedQuestion>) -> Result<Vec<SessionEvent>> {
        if questions.is_empty() {
            return Err(QuizError::NoCapacity);
        }
        self.questions = questions;
        self.current_index = 0;
        self.score = 0;
        self.locked = false;
        self.selection = None;

        let mut events = Vec::new();
        self.begin(self.config.exam_seconds, 0, &mut events);
        info!(total = self.questions.len(), mode = ?self.config.timer_mode, "quiz started");
        Ok(events)
    }

    /// Continue an abandoned run. Score, position and remaining exam time come
    /// from the snapshot; nothing is reset. A question that was already
    /// answered comes back locked with its answer revealed.
    pub fn resume(&mut self, snapshot: PersistedSnapshot) -> Result<Vec<SessionEvent>> {
        if snapshot.finished {
            return Err(QuizError::InvalidRequest("cannot resume a finished quiz".into()));
        }
        if snapshot.questions.is_empty() {
            return Err(QuizError::NoCapacity);
        }
        if snapshot.current_index >= snapshot.questions.len() {
            return Err(QuizError::InvalidRequest(format!(
                "snapshot index {} is past the last of {} questions",
                snapshot.current_index,
                snapshot.questions.len()
            )));
        }

        let exam = self.config.exam_seconds;
        let remaining = snapshot
            .remaining_exam_seconds
            .unwrap_or_else(|| exam.saturating_sub(snapshot.elapsed_seconds));
        let consumed = match snapshot.remaining_exam_seconds {
            Some(r) => exam.saturating_sub(r),
            None => snapshot.elapsed_seconds,
        };

        self.questions = snapshot.questions;
        self.current_index = snapshot.current_index;
        self.score = snapshot.score;
        self.locked = snapshot.current_answered;
        self.selection = if snapshot.current_answered { snapshot.current_selection } else { None };

        let mut events = Vec::new();
        self.begin(remaining, consumed, &mut events);
        info!(
            index = self.current_index,
            score = self.score,
            remaining,
            "quiz resumed"
        );
        Ok(events)
    }

    fn begin(&mut self, exam_remaining: u64, consumed_secs: u64, events: &mut Vec<SessionEvent>) {
        self.state = SessionState::InProgress;
        self.summary = None;
        self.question_timer = None;
        self.exam_timer = None;
        self.started_at_ms = self.clock.now_ms() - (consumed_secs as i64) * 1000;

        if self.config.timer_mode == TimerMode::Exam {
            self.exam_timer = Some(Countdown::new(exam_remaining));
            events.push(SessionEvent::ExamTick { remaining_seconds: exam_remaining });
        }
        self.present(events);
    }

    /// Show the current question. A locked question is re-presented with its
    /// answer revealed and no question countdown.
    fn present(&mut self, events: &mut Vec<SessionEvent>) {
        let current = &self.questions[self.current_index];
        events.push(SessionEvent::QuestionPresented {
            number: self.current_index + 1,
            total: self.questions.len(),
            domain: current.domain.clone(),
            question: current.question.clone(),
        });

        if self.locked {
            let answers = &current.question.answers;
            events.push(SessionEvent::AnswerRevealed {
                selected: self.selection,
                was_correct: self.selection.and_then(|i| answers.get(i)).map_or(false, |a| a.correct),
                correct: current.question.correct_indices(),
            });
        } else if self.config.timer_mode == TimerMode::PerQuestion {
            let secs = self.config.question_seconds;
            self.question_timer = Some(Countdown::new(secs));
            events.push(SessionEvent::QuestionTick { remaining_seconds: secs });
        }
    }

    /// Evaluate the first selection for the current question.
    ///
    /// Later selections, or selections outside a running session, change
    /// nothing and produce no events.
    pub fn select_answer(&mut self, choice: usize) -> Result<Vec<SessionEvent>> {
        if self.state != SessionState::InProgress || self.locked {
            return Ok(Vec::new());
        }
        let question = &self.questions[self.current_index].question;
        let Some(answer) = question.answers.get(choice) else {
            return Err(QuizError::InvalidRequest(format!(
                "answer {choice} does not exist; question has {} answers",
                question.answers.len()
            )));
        };
        let was_correct = answer.correct;
        let correct = question.correct_indices();

        self.question_timer = None;
        self.locked = true;
        self.selection = Some(choice);
        if was_correct {
            self.score += 1;
        }
        debug!(index = self.current_index, choice, was_correct, "answer selected");

        Ok(vec![SessionEvent::AnswerRevealed {
            selected: Some(choice),
            was_correct,
            correct,
        }])
    }

    /// One second of wall time.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.state != SessionState::InProgress {
            return events;
        }

        if let Some(timer) = self.exam_timer.as_mut() {
            let expired = timer.tick();
            let remaining = timer.remaining();
            events.push(SessionEvent::ExamTick { remaining_seconds: remaining });
            if expired {
                info!("exam time expired");
                self.finish(true, &mut events);
                return events;
            }
        }

        if let Some(timer) = self.question_timer.as_mut() {
            let expired = timer.tick();
            let remaining = timer.remaining();
            events.push(SessionEvent::QuestionTick { remaining_seconds: remaining });
            if expired {
                self.question_timer = None;
                self.locked = true;
                debug!(index = self.current_index, "question timed out");
                events.push(SessionEvent::AnswerRevealed {
                    selected: None,
                    was_correct: false,
                    correct: self.questions[self.current_index].question.correct_indices(),
                });
            }
        }
        events
    }

    /// Move on once the current question is locked. Past the last question
    /// the session completes.
    pub fn advance(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.state != SessionState::InProgress || !self.locked {
            debug!(state = %self.state, locked = self.locked, "advance ignored");
            return events;
        }
        self.question_timer = None;
        self.locked = false;
        self.selection = None;
        self.current_index += 1;
        if self.current_index < self.questions.len() {
            self.present(&mut events);
        } else {
            self.finish(false, &mut events);
        }
        events
    }

    /// Leave a running session, saving it so it can be resumed.
    pub fn abandon(&mut self) -> Vec<SessionEvent> {
        if self.state != SessionState::InProgress {
            return Vec::new();
        }
        self.question_timer = None;
        self.state = SessionState::Abandoned;
        let snapshot = self.snapshot();
        self.persist(&snapshot);
        info!(index = self.current_index, score = self.score, "quiz abandoned");
        vec![SessionEvent::Abandoned(snapshot)]
    }

    fn finish(&mut self, timed_out: bool, events: &mut Vec<SessionEvent>) {
        self.question_timer = None;
        self.state = if timed_out { SessionState::TimedOut } else { SessionState::Completed };

        let summary = QuizSummary {
            score: self.score,
            total: self.questions.len(),
            elapsed_seconds: self.elapsed_seconds(),
            timed_out,
            breakdown: domain_breakdown(&self.questions),
            finished_at: self.clock.now_ms(),
        };
        self.summary = Some(summary.clone());

        let snapshot = self.snapshot();
        self.persist(&snapshot);
        info!(
            score = summary.score,
            total = summary.total,
            elapsed = summary.elapsed_seconds,
            timed_out,
            "quiz finished"
        );
        events.push(SessionEvent::Completed(summary));
    }

    /// Seconds spent so far; the full exam duration once timed out.
    pub fn elapsed_seconds(&self) -> u64 {
        match self.state {
            SessionState::NotStarted => 0,
            SessionState::TimedOut => self.config.exam_seconds,
            _ => ((self.clock.now_ms() - self.started_at_ms).max(0) / 1000) as u64,
        }
    }

    /// Serializable projection of the current run.
    pub fn snapshot(&self) -> PersistedSnapshot {
        let finished = self.state.is_finished();
        PersistedSnapshot {
            finished,
            score: self.score,
            total: self.questions.len(),
            elapsed_seconds: self.elapsed_seconds(),
            remaining_exam_seconds: if finished { None } else { self.remaining_exam_seconds() },
            timestamp: self.clock.now_ms(),
            questions: self.questions.clone(),
            current_index: self.current_index,
            current_answered: self.locked,
            current_selection: self.selection,
        }
    }

    fn persist(&self, snapshot: &PersistedSnapshot) {
        if let Err(err) = self.store.save(snapshot) {
            warn!(error = %err, "could not persist quiz snapshot; continuing without it");
        }
    }
}

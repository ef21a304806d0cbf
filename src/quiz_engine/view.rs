//! JSON view models for a quiz UI.
//!
//! The session only emits [`SessionEvent`]s; these functions shape them (and
//! saved snapshots) into what a front end renders. Question views never carry
//! correctness flags, so the answer is only known once it is revealed.

use chrono::{Local, TimeZone};
use serde_json::{json, Value};

use crate::quiz_engine::{
    models::{DomainTally, Question},
    session::{QuizSummary, SessionEvent},
    store::PersistedSnapshot,
    timer::format_clock,
};

pub fn exam_tick_label(remaining_seconds: u64) -> String {
    format!("Time left: {}", format_clock(remaining_seconds))
}

pub fn question_tick_label(remaining_seconds: u64) -> String {
    format!("Time: {remaining_seconds}s")
}

/// Local date and time for an epoch-milliseconds timestamp.
fn local_timestamp(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn breakdown_view(breakdown: &[DomainTally]) -> Value {
    Value::Array(
        breakdown
            .iter()
            .map(|t| json!({ "domain": t.domain, "count": t.count }))
            .collect(),
    )
}

/// Answer texts only, in stored order.
fn question_view(question: &Question) -> Value {
    json!({
        "text": question.text,
        "answers": question.answers.iter().map(|a| a.text.as_str()).collect::<Vec<_>>(),
    })
}

pub fn event_view(event: &SessionEvent) -> Value {
    match event {
        SessionEvent::QuestionPresented { number, total, domain, question } => json!({
            "kind": "question",
            "progress": format!("Question {number} / {total}"),
            "number": number,
            "total": total,
            "domain": domain,
            "question": question_view(question),
        }),
        SessionEvent::AnswerRevealed { selected, was_correct, correct } => json!({
            "kind": "reveal",
            "selected": selected,
            "wasCorrect": was_correct,
            "correct": correct,
            "timedOut": selected.is_none(),
        }),
        SessionEvent::ExamTick { remaining_seconds } => json!({
            "kind": "examTick",
            "remainingSeconds": remaining_seconds,
            "label": exam_tick_label(*remaining_seconds),
        }),
        SessionEvent::QuestionTick { remaining_seconds } => json!({
            "kind": "questionTick",
            "remainingSeconds": remaining_seconds,
            "label": question_tick_label(*remaining_seconds),
        }),
        SessionEvent::Completed(summary) => summary_view(summary),
        SessionEvent::Abandoned(snapshot) => json!({
            "kind": "abandoned",
            "resumeAvailable": snapshot.is_resumable(),
            "tracker": tracker_view(snapshot),
        }),
    }
}

/// The "last quiz" panel shown before a new quiz starts.
pub fn tracker_view(snapshot: &PersistedSnapshot) -> Value {
    let status = if snapshot.finished { "Last quiz finished" } else { "Last quiz incomplete" };
    json!({
        "status": status,
        "score": format!("{} / {}", snapshot.score, snapshot.total),
        "time": format_clock(snapshot.elapsed_seconds),
        "date": local_timestamp(snapshot.timestamp),
        "breakdown": breakdown_view(&snapshot.breakdown()),
        "resumeAvailable": snapshot.is_resumable(),
    })
}

pub fn summary_view(summary: &QuizSummary) -> Value {
    let status = if summary.timed_out { "Quiz ended: time expired" } else { "Quiz finished" };
    json!({
        "kind": "summary",
        "status": status,
        "headline": format!("You scored {} out of {}!", summary.score, summary.total),
        "time": format_clock(summary.elapsed_seconds),
        "date": local_timestamp(summary.finished_at),
        "breakdown": breakdown_view(&summary.breakdown),
    })
}

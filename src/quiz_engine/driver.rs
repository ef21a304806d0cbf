//! Async loop that feeds a running session its one-second ticks and the
//! user's actions, and forwards what the session emits.
//!
//! One task owns the session, so ticks and actions never interleave inside a
//! state transition. Closing the action channel counts as abandoning the quiz,
//! the same as closing the quiz window.

use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, warn};

use crate::quiz_engine::session::{QuizSession, SessionEvent, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Select(usize),
    Advance,
    Abandon,
}

/// Drive `session` until it leaves `InProgress`, then hand it back.
pub async fn run_session(
    mut session: QuizSession,
    mut actions: mpsc::Receiver<UserAction>,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> QuizSession {
    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    ticker.tick().await;

    while session.state() == SessionState::InProgress {
        let produced = tokio::select! {
            _ = ticker.tick() => session.tick(),
            action = actions.recv() => match action {
                Some(UserAction::Select(choice)) => session.select_answer(choice).unwrap_or_else(|err| {
                    warn!(error = %err, "selection rejected");
                    Vec::new()
                }),
                Some(UserAction::Advance) => session.advance(),
                Some(UserAction::Abandon) | None => session.abandon(),
            },
        };
        for event in produced {
            if events.send(event).is_err() {
                debug!("event receiver dropped");
            }
        }
    }
    session
}

//! End-to-end demo: assemble a quiz, run it, abandon it, resume it.
//!
//! Run with: `cargo run --example demo`
//! Set `RUST_LOG=quiz_runner=debug` to see allocation and lifecycle logs.
//!
//! 1. **Assembly**: a 6-question quiz is drawn from three inline pools with a
//!    fixed seed, so the output is reproducible.
//! 2. **Abandon**: a scripted user answers two questions and then closes the
//!    quiz; the session saves a snapshot to an in-memory store.
//! 3. **Resume**: a fresh session picks up from the snapshot and the scripted
//!    user finishes the remaining questions.

use std::sync::Arc;

use quiz_runner::{
    quiz_engine::{load_last_quiz, view, MemoryStore, SnapshotStore},
    quiz_rng, run_session, Answer, InlineSource, Pool, Question, QuizAssembler, QuizRequest,
    QuizSession, SessionConfig, SessionEvent, UserAction,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

fn pools() -> Vec<Pool> {
    let q = |text: &str, right: &str, wrong: &str| {
        Question::new(text, vec![Answer::new(wrong, false), Answer::new(right, true)])
    };
    vec![
        Pool::new("networking", vec![
            q("Which layer does TCP live in?", "Transport", "Session"),
            q("Default HTTPS port?", "443", "8443"),
            q("What does DNS resolve?", "Names to addresses", "Addresses to MACs"),
        ]),
        Pool::new("storage", vec![
            q("RAID 1 is…", "Mirroring", "Striping"),
            q("An inode stores…", "File metadata", "File names"),
        ]),
        Pool::new("security", vec![
            q("A salt protects against…", "Rainbow tables", "Phishing"),
            q("TLS provides…", "Encryption in transit", "Encryption at rest"),
            q("Least privilege means…", "Minimal rights", "No passwords"),
        ]),
    ]
}

/// A user who always picks the second answer, quitting after `stop_after`
/// questions if given.
async fn scripted_user(left: usize, stop_after: Option<usize>, tx: mpsc::Sender<UserAction>) {
    let answered = stop_after.unwrap_or(left);
    for _ in 0..answered {
        if tx.send(UserAction::Select(1)).await.is_err() || tx.send(UserAction::Advance).await.is_err() {
            return;
        }
    }
    if stop_after.is_some() {
        let _ = tx.send(UserAction::Abandon).await;
    }
}

fn print_events(events: &mut mpsc::UnboundedReceiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        match &event {
            SessionEvent::ExamTick { .. } | SessionEvent::QuestionTick { .. } => {}
            _ => println!("  {}", view::event_view(&event)),
        }
    }
}

async fn drive(session: QuizSession, stop_after: Option<usize>) -> QuizSession {
    let (action_tx, action_rx) = mpsc::channel(4);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let user = tokio::spawn(scripted_user(session.total() - session.current_index(), stop_after, action_tx));
    let session = run_session(session, action_rx, event_tx).await;
    let _ = user.await;
    print_events(&mut event_rx);
    session
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Assembling 6 questions from 3 pools (seed 7)");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let assembler = QuizAssembler::new(InlineSource::new(pools()));
    let quiz = assembler
        .assemble(&QuizRequest::total(6, Vec::<String>::new()), &mut quiz_rng(Some(7)))
        .await?;
    for (i, q) in quiz.iter().enumerate() {
        println!("  {:>2}. [{}] {}", i + 1, q.domain, q.question.text);
    }

    let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());

    println!();
    println!("  First attempt: answer two, then close the quiz");
    let mut session = QuizSession::new(SessionConfig::default()).with_store(store.clone());
    session.start(quiz)?;
    let session = drive(session, Some(2)).await;
    println!("  state: {}", session.state());

    let Some(saved) = load_last_quiz(store.as_ref()) else {
        println!("  nothing saved, cannot resume");
        return Ok(());
    };
    println!("  tracker: {}", view::tracker_view(&saved));

    println!();
    println!("  Second attempt: resume and finish");
    let mut session = QuizSession::new(SessionConfig::default()).with_store(store.clone());
    session.resume(saved)?;
    let remaining = session.total() - session.current_index();
    let session = drive(session, None).await;
    println!("  answered {remaining} more, state: {}", session.state());
    if let Some(summary) = session.summary() {
        println!("  {}", view::summary_view(summary));
    }
    Ok(())
}

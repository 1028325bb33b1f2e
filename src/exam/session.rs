// src/exam/session.rs

//! Client-side exam session: one in-progress attempt and its countdown.
//!
//! This is the state a native client owns while a student takes a test. It
//! is an explicit object, not a global store: whoever owns the exam screen
//! holds the session (usually behind `Arc<Mutex<_>>` so the countdown task
//! can tick it). The session never trusts its own notion of correctness;
//! scoring happens server-side in [`crate::exam::evaluator`].
//!
//! The whole session is serde-serializable so a client can stash it in
//! local storage and survive a restart mid-attempt.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

use crate::models::question::PublicQuestion;
use crate::models::test::{SubmittedAnswer, Test};

/// Attempt lifecycle. `Submitting` exists so the UI can disable further
/// submit triggers while a request is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    InProgress,
    Submitting,
}

/// One answer under construction. Upsert semantics: the first write creates
/// the draft, later writes merge fields into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDraft {
    pub question_id: i64,
    pub selected_option: Option<String>,
    pub code_submitted: Option<String>,
    pub marked_for_review: bool,
}

/// Fields merged into an [`AnswerDraft`] by [`ExamSession::set_answer`].
/// `None` leaves the existing value untouched.
#[derive(Debug, Clone, Default)]
pub struct AnswerPatch {
    pub selected_option: Option<String>,
    pub code_submitted: Option<String>,
}

/// Snapshot handed to the network layer when a submit begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionDraft {
    pub test_id: i64,
    pub answers: Vec<SubmittedAnswer>,
    pub elapsed_secs: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SessionError {
    EmptyQuestionList,
    NotInProgress,
    AlreadySubmitting,
    PositionOutOfBounds { index: usize, len: usize },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyQuestionList => write!(f, "cannot start a test with no questions"),
            SessionError::NotInProgress => write!(f, "no attempt is in progress"),
            SessionError::AlreadySubmitting => write!(f, "a submission is already in flight"),
            SessionError::PositionOutOfBounds { index, len } => {
                write!(f, "position {} out of bounds (0..{})", index, len)
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Result of one cooperative 1-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No attempt in progress; the tick did nothing.
    Inactive,
    Running {
        remaining_secs: u64,
    },
    /// The deadline was reached: the owner must auto-submit now.
    Expired,
}

/// One student's in-progress pass through a single test.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSession {
    phase: Phase,
    test: Option<Test>,
    questions: Vec<PublicQuestion>,
    answers: Vec<AnswerDraft>,
    current_index: usize,
    remaining_secs: u64,
    elapsed_secs: u64,
}

impl ExamSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn questions(&self) -> &[PublicQuestion] {
        &self.questions
    }

    pub fn answers(&self) -> &[AnswerDraft] {
        &self.answers
    }

    pub fn answer_for(&self, question_id: i64) -> Option<&AnswerDraft> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&PublicQuestion> {
        self.questions.get(self.current_index)
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// Loads an attempt and arms the countdown at `duration_minutes * 60`.
    /// A silent no-op when an attempt is already active: callers must
    /// `finish()` before starting again.
    pub fn start(
        &mut self,
        test: Test,
        questions: Vec<PublicQuestion>,
    ) -> Result<(), SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyQuestionList);
        }
        if self.phase != Phase::Idle {
            return Ok(());
        }

        self.remaining_secs = test.duration_minutes.max(0) as u64 * 60;
        self.elapsed_secs = 0;
        self.test = Some(test);
        self.questions = questions;
        self.answers.clear();
        self.current_index = 0;
        self.phase = Phase::InProgress;
        Ok(())
    }

    /// Merges `patch` into the draft for `question_id`, creating it on first
    /// write. The option text is NOT validated against the question here;
    /// the evaluator scores an unmatched option as incorrect.
    pub fn set_answer(&mut self, question_id: i64, patch: AnswerPatch) -> Result<(), SessionError> {
        if self.phase != Phase::InProgress {
            return Err(SessionError::NotInProgress);
        }

        match self.answers.iter_mut().find(|a| a.question_id == question_id) {
            Some(draft) => {
                if let Some(option) = patch.selected_option {
                    draft.selected_option = Some(option);
                }
                if let Some(code) = patch.code_submitted {
                    draft.code_submitted = Some(code);
                }
            }
            None => {
                self.answers.push(AnswerDraft {
                    question_id,
                    selected_option: patch.selected_option,
                    code_submitted: patch.code_submitted,
                    marked_for_review: false,
                });
            }
        }
        Ok(())
    }

    /// Flips the review flag, creating a bare draft if none exists yet.
    pub fn toggle_review(&mut self, question_id: i64) -> Result<(), SessionError> {
        if self.phase != Phase::InProgress {
            return Err(SessionError::NotInProgress);
        }

        match self.answers.iter_mut().find(|a| a.question_id == question_id) {
            Some(draft) => draft.marked_for_review = !draft.marked_for_review,
            None => self.answers.push(AnswerDraft {
                question_id,
                selected_option: None,
                code_submitted: None,
                marked_for_review: true,
            }),
        }
        Ok(())
    }

    /// Moves to another question. Out-of-range indices are rejected, not
    /// clamped, so navigation bugs surface early.
    pub fn set_position(&mut self, index: usize) -> Result<(), SessionError> {
        if self.phase != Phase::InProgress {
            return Err(SessionError::NotInProgress);
        }
        if index >= self.questions.len() {
            return Err(SessionError::PositionOutOfBounds {
                index,
                len: self.questions.len(),
            });
        }
        self.current_index = index;
        Ok(())
    }

    /// One cooperative second of the countdown. Inert in any phase other
    /// than `InProgress`, so a stray tick after `finish()` can never fire an
    /// auto-submit.
    pub fn tick(&mut self) -> Tick {
        if self.phase != Phase::InProgress {
            return Tick::Inactive;
        }

        self.elapsed_secs += 1;
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            Tick::Expired
        } else {
            Tick::Running {
                remaining_secs: self.remaining_secs,
            }
        }
    }

    /// Freezes the accumulated answers into a submission snapshot and moves
    /// to `Submitting`, which blocks further submit triggers.
    pub fn begin_submit(&mut self) -> Result<SubmissionDraft, SessionError> {
        match self.phase {
            Phase::Submitting => return Err(SessionError::AlreadySubmitting),
            Phase::Idle => return Err(SessionError::NotInProgress),
            Phase::InProgress => {}
        }
        let Some(test) = self.test.as_ref() else {
            return Err(SessionError::NotInProgress);
        };

        let draft = SubmissionDraft {
            test_id: test.id,
            answers: self
                .answers
                .iter()
                .map(|a| SubmittedAnswer {
                    question_id: a.question_id,
                    selected_option: a.selected_option.clone(),
                    code_submitted: a.code_submitted.clone(),
                })
                .collect(),
            elapsed_secs: self.elapsed_secs,
        };
        self.phase = Phase::Submitting;
        Ok(draft)
    }

    /// The submit request failed: back to `InProgress` with every answer
    /// intact. The countdown is NOT re-armed — the driver task has already
    /// exited, so elapsed time stays frozen at the failure point.
    pub fn submit_failed(&mut self) {
        if self.phase == Phase::Submitting {
            self.phase = Phase::InProgress;
        }
    }

    /// Clears all attempt state. Called after a successful submit or an
    /// explicit abandonment.
    pub fn finish(&mut self) {
        *self = Self::default();
    }
}

/// Fixed-interval driver for [`ExamSession::tick`].
///
/// Ticks once per second while the attempt is in progress. On expiry it
/// performs the non-confirmable auto-submit transition itself and hands the
/// snapshot to the owner through `expiry_tx`; the owner sends it to the
/// server. Exits as soon as the session leaves `InProgress`.
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    pub fn spawn(
        session: Arc<Mutex<ExamSession>>,
        expiry_tx: mpsc::Sender<SubmissionDraft>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            // the first interval tick completes immediately; consume it so
            // the countdown starts one full second after spawn
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let mut guard = session.lock().await;
                match guard.tick() {
                    Tick::Running { .. } => {}
                    Tick::Inactive => break,
                    Tick::Expired => {
                        if let Ok(draft) = guard.begin_submit() {
                            drop(guard);
                            let _ = expiry_tx.send(draft).await;
                        }
                        break;
                    }
                }
            }
        });
        Self { handle }
    }

    /// Cancels the driver. Even without an explicit stop, a stray tick is
    /// harmless: `tick()` is inert outside `InProgress`.
    pub fn stop(self) {
        self.handle.abort();
    }
}

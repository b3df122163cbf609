//! The interview session state machine.
//!
//! A session moves Upload → Interview → Feedback. Every operation that talks
//! to the service holds the turn guard for its whole duration, so at most one
//! request is in flight and a second caller is turned away instead of queued.
//! State is only touched under the state lock, never across an `.await`.

use crate::error::{ProtocolError, SessionError};
use crate::model::{
    AnalysisLogEntry, AudioBlob, FeedbackReport, Message, PROCESSING_VOICE, ResumeProfile,
    SessionPhase, SynthesizedClip,
};
use crate::playback::AudioPlaybackController;
use crate::protocol::{AssistantReply, TurnInput, TurnProtocol};
use crate::report::ReportAssembler;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Answered turns needed before a report may be requested.
pub const MIN_TURNS_FOR_REPORT: usize = 3;

/// Everything one interview accumulates.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub resume: ResumeProfile,
    pub transcript: Vec<Message>,
    pub analysis_log: Vec<AnalysisLogEntry>,
    /// Transcript indices of user turns whose request failed. The entries stay
    /// in the transcript as they were submitted.
    pub failed_turns: Vec<usize>,
    pub reports: ReportAssembler,
}

impl SessionState {
    /// User turns that received an assistant reply.
    pub fn completed_user_turns(&self) -> usize {
        self.analysis_log.len().saturating_sub(1)
    }

    pub fn report(&self) -> Option<&FeedbackReport> {
        self.reports.report()
    }

    fn require_phase(&self, expected: SessionPhase) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    fn resume_text(&self) -> Result<String, SessionError> {
        self.resume
            .text()
            .map(str::to_string)
            .ok_or(SessionError::ResumeMissing)
    }
}

// Marks a request as in flight; the flag is cleared when the guard drops,
// whether the request succeeded, failed, panicked or was cancelled.
struct TurnGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> TurnGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SessionError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::ConcurrentTurnRejected)?;
        Ok(Self { flag })
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct InterviewSession<P: TurnProtocol> {
    protocol: P,
    state: Mutex<SessionState>,
    in_flight: AtomicBool,
    playback: Mutex<AudioPlaybackController>,
}

impl<P: TurnProtocol> InterviewSession<P> {
    pub fn new(protocol: P, playback: AudioPlaybackController) -> Self {
        Self {
            protocol,
            state: Mutex::new(SessionState::default()),
            in_flight: AtomicBool::new(false),
            playback: Mutex::new(playback),
        }
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    // A panic while the lock is held cannot leave the state half-written:
    // every mutation below is a plain push or assignment.
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn play(&self, clip: Option<SynthesizedClip>) {
        if let Some(clip) = clip {
            self.playback
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .play(clip);
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock_state().phase
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.lock_state().clone()
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.lock_state().transcript.clone()
    }

    pub fn analysis_log(&self) -> Vec<AnalysisLogEntry> {
        self.lock_state().analysis_log.clone()
    }

    pub fn report(&self) -> Option<FeedbackReport> {
        self.lock_state().report().cloned()
    }

    pub fn is_turn_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Requests the interviewer's introduction and enters the interview phase.
    ///
    /// On failure the session stays in the upload phase with an empty
    /// transcript, so `begin` can simply be called again.
    pub async fn begin(&self, resume: ResumeProfile) -> Result<(), SessionError> {
        let _guard = TurnGuard::acquire(&self.in_flight)?;
        self.lock_state().require_phase(SessionPhase::Upload)?;
        let resume_text = resume.text().ok_or(SessionError::ResumeMissing)?.to_string();

        tracing::info!("Starting interview ({} chars of resume)", resume_text.len());
        let reply = self
            .protocol
            .send_opening_turn(&resume_text)
            .await
            .map_err(|e| {
                tracing::error!("Opening turn failed: {e}");
                SessionError::StartupFailure(e)
            })?;

        let clip = {
            let mut state = self.lock_state();
            state.transcript.push(Message::assistant(reply.speech));
            state.analysis_log.push(AnalysisLogEntry {
                turn_index: 0,
                note: reply.analysis_note,
            });
            state.resume = resume;
            state.phase = SessionPhase::Interview;
            reply.clip
        };
        tracing::info!("Session phase: {}", SessionPhase::Interview);
        self.play(clip);
        Ok(())
    }

    /// Submits a typed answer.
    ///
    /// The user message is appended before the request goes out and stays in
    /// the transcript if the request fails.
    pub async fn submit_text(&self, text: &str) -> Result<(), SessionError> {
        let _guard = TurnGuard::acquire(&self.in_flight)?;
        let text = text.trim();
        let (resume_text, snapshot, user_index) = {
            let mut state = self.lock_state();
            state.require_phase(SessionPhase::Interview)?;
            if text.is_empty() {
                return Err(SessionError::EmptyTurn);
            }
            let resume_text = state.resume_text()?;
            let snapshot = state.transcript.clone();
            state.transcript.push(Message::user(text));
            (resume_text, snapshot, state.transcript.len() - 1)
        };

        tracing::debug!("Sending text turn {}", user_index);
        let result = self
            .protocol
            .send_turn(&resume_text, &snapshot, TurnInput::Text(text.to_string()))
            .await;
        self.finish_turn(user_index, false, result)
    }

    /// Submits a recorded answer.
    ///
    /// A placeholder user message is appended first and replaced in place by
    /// the server's transcription. If the request fails the placeholder keeps
    /// its sentinel content.
    pub async fn submit_audio(&self, blob: AudioBlob) -> Result<(), SessionError> {
        let _guard = TurnGuard::acquire(&self.in_flight)?;
        let (resume_text, snapshot, placeholder_index) = {
            let mut state = self.lock_state();
            state.require_phase(SessionPhase::Interview)?;
            let resume_text = state.resume_text()?;
            let snapshot = state.transcript.clone();
            state.transcript.push(Message::user(PROCESSING_VOICE));
            (resume_text, snapshot, state.transcript.len() - 1)
        };

        tracing::debug!(
            "Sending voice turn {} ({} bytes)",
            placeholder_index,
            blob.bytes.len()
        );
        let result = self
            .protocol
            .send_turn(&resume_text, &snapshot, TurnInput::Audio(blob))
            .await;
        self.finish_turn(placeholder_index, true, result)
    }

    fn finish_turn(
        &self,
        user_index: usize,
        voice: bool,
        result: Result<AssistantReply, ProtocolError>,
    ) -> Result<(), SessionError> {
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Turn {} failed: {}", user_index, e);
                self.lock_state().failed_turns.push(user_index);
                return Err(SessionError::TurnFailure(e));
            }
        };

        let clip = {
            let mut state = self.lock_state();
            if voice {
                match (reply.transcribed_user_text, state.transcript.get_mut(user_index)) {
                    (Some(text), Some(placeholder)) => placeholder.content = text,
                    (None, _) => tracing::warn!("Voice turn {} came back without a transcription", user_index),
                    (Some(_), None) => tracing::error!("Placeholder {} vanished from the transcript", user_index),
                }
            }
            let turn_index = state.analysis_log.len();
            state.transcript.push(Message::assistant(reply.speech));
            state.analysis_log.push(AnalysisLogEntry {
                turn_index,
                note: reply.analysis_note,
            });
            tracing::debug!("Turn {} complete", turn_index);
            reply.clip
        };
        self.play(clip);
        Ok(())
    }

    /// Ends the interview and requests the scored report.
    pub async fn conclude(&self) -> Result<(), SessionError> {
        let _guard = TurnGuard::acquire(&self.in_flight)?;
        let request = {
            let state = self.lock_state();
            state.require_phase(SessionPhase::Interview)?;
            let completed = state.completed_user_turns();
            if completed < MIN_TURNS_FOR_REPORT {
                return Err(SessionError::InsufficientTurns {
                    completed,
                    required: MIN_TURNS_FOR_REPORT,
                });
            }
            ReportAssembler::assemble(&state.resume, &state.transcript, &state.analysis_log)?
        };

        tracing::info!(
            "Requesting report for {} messages",
            request.chat_history.len()
        );
        let report = self
            .protocol
            .send_report_request(&request)
            .await
            .map_err(|e| {
                tracing::error!("Report request failed: {e}");
                SessionError::ReportFailure(e)
            })?;

        {
            let mut state = self.lock_state();
            state.reports.accept(report);
            state.phase = SessionPhase::Feedback;
        }
        self.playback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stop();
        tracing::info!("Session phase: {}", SessionPhase::Feedback);
        Ok(())
    }

    /// Discards everything and returns to the upload phase.
    pub fn reset(&self) -> Result<(), SessionError> {
        let _guard = TurnGuard::acquire(&self.in_flight)?;
        *self.lock_state() = SessionState::default();
        self.playback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stop();
        tracing::info!("Session reset");
        Ok(())
    }
}

//! Client-side orchestration of a mock interview: session phases, the turn
//! protocol with the interview service, and the audio capture and playback
//! lifecycles that interleave with it.

pub mod capture;
pub mod error;
pub mod history;
pub mod model;
pub mod playback;
pub mod protocol;
pub mod report;
pub mod resume;
pub mod session;

pub use capture::{AudioCaptureController, CaptureState, Microphone, MicrophoneStream};
pub use error::{CaptureError, ProtocolError, SessionError};
pub use model::{
    AnalysisLogEntry, AudioBlob, FeedbackReport, HistoryRecord, Message, ResumeProfile, Role,
    ScoreBand, SessionPhase, SynthesizedClip,
};
pub use playback::{AudioPlaybackController, AudioSink};
pub use protocol::{AssistantReply, HttpTurnProtocol, TurnInput, TurnProtocol};
pub use report::{FeedbackRequest, ReportAssembler};
pub use session::{InterviewSession, MIN_TURNS_FOR_REPORT, SessionState};

use crate::model::SessionPhase;

/// Failures at the boundary with the remote interview service.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The service could not be reached: connection errors, timeouts and
    /// empty gateway responses.
    #[error("network failure: {0}")]
    NetworkFailure(String),
    /// The service answered, but refused or failed the request.
    #[error("rejected by the service: {0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ProtocolError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ProtocolError::NetworkFailure(err.to_string())
        } else if err.is_decode() || err.is_body() {
            ProtocolError::MalformedResponse(err.to_string())
        } else {
            ProtocolError::NetworkFailure(err.to_string())
        }
    }
}

/// Microphone lifecycle failures.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("microphone access denied: {0}")]
    MicrophoneDenied(String),
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("failed to encode the recording: {0}")]
    Encoding(#[source] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("could not read the resume: {0}")]
    ResumeParseFailure(String),
    #[error("failed to start the interview")]
    StartupFailure(#[source] ProtocolError),
    #[error("microphone access denied: {0}")]
    MicrophoneDenied(String),
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("another turn is still in flight")]
    ConcurrentTurnRejected,
    #[error("the turn could not be completed")]
    TurnFailure(#[source] ProtocolError),
    #[error("failed to generate the report")]
    ReportFailure(#[source] ProtocolError),
    #[error("network failure")]
    NetworkFailure(#[source] ProtocolError),
    #[error("failed to prepare the recording")]
    RecordingFailure(#[source] anyhow::Error),
    #[error("operation requires the {expected} phase, session is in {actual}")]
    InvalidPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },
    #[error("cannot submit an empty turn")]
    EmptyTurn,
    #[error("no resume text is available")]
    ResumeMissing,
    #[error("{completed} answered turns so far, at least {required} are needed for a report")]
    InsufficientTurns { completed: usize, required: usize },
}

impl SessionError {
    /// Local guard violations that come from rapid double interaction. They are
    /// logged, not shown to the user.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            SessionError::AlreadyRecording | SessionError::ConcurrentTurnRejected
        )
    }

    /// The underlying transport error, if this failure came from the service.
    pub fn protocol_error(&self) -> Option<&ProtocolError> {
        match self {
            SessionError::StartupFailure(e)
            | SessionError::TurnFailure(e)
            | SessionError::ReportFailure(e)
            | SessionError::NetworkFailure(e) => Some(e),
            _ => None,
        }
    }

    /// True when the service could not be reached at all.
    pub fn is_network(&self) -> bool {
        matches!(self.protocol_error(), Some(ProtocolError::NetworkFailure(_)))
    }
}

impl From<CaptureError> for SessionError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::MicrophoneDenied(reason) => SessionError::MicrophoneDenied(reason),
            CaptureError::AlreadyRecording => SessionError::AlreadyRecording,
            CaptureError::Encoding(e) => SessionError::RecordingFailure(e),
        }
    }
}

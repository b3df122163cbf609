use async_trait::async_trait;
use mockmate_core::{
    AssistantReply, AudioBlob, AudioPlaybackController, FeedbackReport, FeedbackRequest,
    HistoryRecord, InterviewSession, Message, ProtocolError, ResumeProfile, Role, SessionError,
    SessionPhase, TurnInput, TurnProtocol,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned replies in order and records what the session sent.
#[derive(Default)]
struct ScriptedProtocol {
    opening: Mutex<VecDeque<Result<AssistantReply, ProtocolError>>>,
    turns: Mutex<VecDeque<Result<AssistantReply, ProtocolError>>>,
    sent_turns: Mutex<Vec<(usize, TurnInput)>>,
    report_requests: Mutex<Vec<FeedbackRequest>>,
}

impl ScriptedProtocol {
    fn with_opening(self, reply: Result<AssistantReply, ProtocolError>) -> Self {
        self.opening.lock().unwrap().push_back(reply);
        self
    }

    fn with_turn(self, reply: Result<AssistantReply, ProtocolError>) -> Self {
        self.turns.lock().unwrap().push_back(reply);
        self
    }
}

fn reply(speech: &str, note: &str) -> AssistantReply {
    AssistantReply {
        speech: speech.to_string(),
        analysis_note: note.to_string(),
        ..Default::default()
    }
}

#[async_trait]
impl TurnProtocol for ScriptedProtocol {
    async fn extract_resume(&self, _: &str, _: Vec<u8>) -> Result<String, ProtocolError> {
        Ok("Senior backend engineer, 5 yrs".to_string())
    }

    async fn send_opening_turn(&self, _: &str) -> Result<AssistantReply, ProtocolError> {
        self.opening
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected opening turn")
    }

    async fn send_turn(
        &self,
        _: &str,
        transcript: &[Message],
        input: TurnInput,
    ) -> Result<AssistantReply, ProtocolError> {
        self.sent_turns
            .lock()
            .unwrap()
            .push((transcript.len(), input));
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected turn")
    }

    async fn send_report_request(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackReport, ProtocolError> {
        self.report_requests.lock().unwrap().push(request.clone());
        Ok(FeedbackReport {
            score: 68,
            verdict: "Lean Hire".to_string(),
            summary: "Solid fundamentals, light on metrics.".to_string(),
            ..Default::default()
        })
    }

    async fn list_history(&self) -> Result<Vec<HistoryRecord>, ProtocolError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_three_text_turns_then_report() {
    let mut protocol = ScriptedProtocol::default()
        .with_opening(Ok(reply("Hi, I'm Shreya. Walk me through your resume.", "Starting interview.")));
    for n in 1..=3 {
        protocol = protocol.with_turn(Ok(reply(&format!("Follow-up {n}"), &format!("Note {n}"))));
    }
    let session = InterviewSession::new(protocol, AudioPlaybackController::muted());

    session
        .begin(ResumeProfile::new("Senior backend engineer, 5 yrs"))
        .await
        .unwrap();
    assert_eq!(session.phase(), SessionPhase::Interview);
    assert_eq!(session.transcript()[0].role, Role::Assistant);
    assert_eq!(session.analysis_log().len(), 1);
    assert_eq!(session.analysis_log()[0].turn_index, 0);

    for _ in 0..3 {
        session.submit_text("I built a caching layer").await.unwrap();
    }
    assert_eq!(session.transcript().len(), 7);
    assert_eq!(session.analysis_log().len(), 4);

    session.conclude().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Feedback);
    assert_eq!(session.report().map(|r| r.verdict), Some("Lean Hire".to_string()));

    let protocol = session.protocol();
    let sent: Vec<usize> = protocol.sent_turns.lock().unwrap().iter().map(|(n, _)| *n).collect();
    assert_eq!(sent, vec![1, 3, 5]);

    let requests = protocol.report_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].chat_history.len(), 7);
    assert_eq!(requests[0].analysis_log[0], "Turn 0 (Intro): Starting interview.");
    assert_eq!(requests[0].analysis_log[3], "Turn 3: Note 3");
}

#[tokio::test]
async fn test_voice_turn_transcription_lands_in_placeholder() {
    let protocol = ScriptedProtocol::default()
        .with_opening(Ok(reply("Tell me about a hard project.", "Starting interview.")))
        .with_turn(Ok(AssistantReply {
            transcribed_user_text: Some("I led the migration".to_string()),
            ..reply("What went wrong?", "Clear ownership.")
        }));
    let session = InterviewSession::new(protocol, AudioPlaybackController::muted());
    session
        .begin(ResumeProfile::new("Senior backend engineer, 5 yrs"))
        .await
        .unwrap();

    session
        .submit_audio(AudioBlob::wav(vec![0u8; 64]))
        .await
        .unwrap();

    let transcript = session.transcript();
    assert_eq!(transcript[1], Message::user("I led the migration"));
    assert_eq!(transcript[2], Message::assistant("What went wrong?"));
}

#[tokio::test]
async fn test_startup_failure_leaves_session_in_upload() {
    let protocol = ScriptedProtocol::default().with_opening(Err(ProtocolError::NetworkFailure(
        "connection refused".to_string(),
    )));
    let session = InterviewSession::new(protocol, AudioPlaybackController::muted());

    let err = session
        .begin(ResumeProfile::new("Senior backend engineer, 5 yrs"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::StartupFailure(_)));
    assert_eq!(session.phase(), SessionPhase::Upload);
    assert!(session.transcript().is_empty());
}

use crate::error::ProtocolError;
use crate::model::{AudioBlob, FeedbackReport, HistoryRecord, Message, SynthesizedClip};
use crate::report::FeedbackRequest;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use mockmate_native_utils::audio;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

/// What the candidate contributed in one turn. Exactly one of the two is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnInput {
    Text(String),
    Audio(AudioBlob),
}

/// The interviewer's side of one turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssistantReply {
    pub speech: String,
    pub analysis_note: String,
    /// Server-side transcription of an audio turn.
    pub transcribed_user_text: Option<String>,
    pub clip: Option<SynthesizedClip>,
}

/// The remote interview service.
///
/// Every call is single-shot: implementations never retry, the caller decides
/// whether a failed call is worth repeating.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TurnProtocol: Send + Sync {
    /// Turns an uploaded resume file into plain text.
    async fn extract_resume(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ProtocolError>;

    /// Asks for the interviewer's introduction.
    async fn send_opening_turn(&self, resume_text: &str) -> Result<AssistantReply, ProtocolError>;

    /// Sends one candidate turn along with the transcript as it stood before the turn.
    async fn send_turn(
        &self,
        resume_text: &str,
        transcript: &[Message],
        input: TurnInput,
    ) -> Result<AssistantReply, ProtocolError>;

    async fn send_report_request(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackReport, ProtocolError>;

    /// Past interviews, newest first.
    async fn list_history(&self) -> Result<Vec<HistoryRecord>, ProtocolError>;
}

#[derive(Debug, Deserialize)]
struct ResumeResponse {
    resume_text: String,
}

#[derive(Debug, Deserialize)]
struct TurnResponse {
    #[serde(default)]
    user_text: Option<String>,
    #[serde(default)]
    ai_speech: Option<String>,
    #[serde(default)]
    ai_analysis: Option<String>,
    #[serde(default)]
    audio_base64: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl TurnResponse {
    fn into_reply(self) -> Result<AssistantReply, ProtocolError> {
        if let Some(error) = self.error {
            return Err(ProtocolError::Rejected(error));
        }
        let speech = self
            .ai_speech
            .ok_or_else(|| ProtocolError::MalformedResponse("missing ai_speech".to_string()))?;
        Ok(AssistantReply {
            speech,
            analysis_note: self.ai_analysis.unwrap_or_default(),
            transcribed_user_text: self.user_text.filter(|t| !t.trim().is_empty()),
            clip: self.audio_base64.as_deref().and_then(decode_clip),
        })
    }
}

// Audio is an enhancement: a clip that fails to decode is dropped, not an error.
fn decode_clip(encoded: &str) -> Option<SynthesizedClip> {
    match audio::decode_base64(encoded) {
        Ok(bytes) if !bytes.is_empty() => Some(SynthesizedClip(bytes)),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Dropping undecodable speech clip: {e}");
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: serde_json::Value,
}

/// `TurnProtocol` over the service's HTTP API.
pub struct HttpTurnProtocol {
    client: Client,
    base_url: String,
}

impl HttpTurnProtocol {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProtocolError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    // A status with a body means the service was reached and refused or failed
    // the request. Only an empty gateway response says the service is down.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ProtocolError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        tracing::error!("Service returned {status}: {body}");
        if body.trim().is_empty() && is_gateway_status(status) {
            return Err(ProtocolError::NetworkFailure(status.to_string()));
        }
        let detail = serde_json::from_str::<ErrorDetail>(&body)
            .map(|d| match d.detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or(body);
        if detail.trim().is_empty() {
            Err(ProtocolError::Rejected(status.to_string()))
        } else {
            Err(ProtocolError::Rejected(detail))
        }
    }

    async fn post_turn_form(&self, path: &str, form: Form) -> Result<AssistantReply, ProtocolError> {
        let resp = self.client.post(self.url(path)).multipart(form).send().await?;
        let resp = Self::check_status(resp).await?;
        resp.json::<TurnResponse>().await?.into_reply()
    }
}

fn is_gateway_status(status: reqwest::StatusCode) -> bool {
    matches!(
        status,
        reqwest::StatusCode::BAD_GATEWAY
            | reqwest::StatusCode::SERVICE_UNAVAILABLE
            | reqwest::StatusCode::GATEWAY_TIMEOUT
    )
}

fn resume_mime(file_name: &str) -> &'static str {
    if file_name.to_ascii_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

#[async_trait]
impl TurnProtocol for HttpTurnProtocol {
    async fn extract_resume(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ProtocolError> {
        tracing::debug!("Uploading resume {} ({} bytes)", file_name, bytes.len());
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(resume_mime(file_name))?;
        let form = Form::new().part("file", part);
        let resp = self
            .client
            .post(self.url("extract-resume"))
            .multipart(form)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        Ok(resp.json::<ResumeResponse>().await?.resume_text)
    }

    async fn send_opening_turn(&self, resume_text: &str) -> Result<AssistantReply, ProtocolError> {
        let form = Form::new().text("resume_text", resume_text.to_string());
        let mut reply = self.post_turn_form("start-interview", form).await?;
        reply.transcribed_user_text = None;
        Ok(reply)
    }

    async fn send_turn(
        &self,
        resume_text: &str,
        transcript: &[Message],
        input: TurnInput,
    ) -> Result<AssistantReply, ProtocolError> {
        let history = serde_json::to_string(transcript)
            .map_err(|e| ProtocolError::MalformedResponse(format!("transcript: {e}")))?;
        let form = Form::new()
            .text("resume_text", resume_text.to_string())
            .text("chat_history_json", history);
        let form = match input {
            TurnInput::Text(text) => form.text("user_text", text),
            TurnInput::Audio(blob) => {
                tracing::debug!("Sending audio turn ({} bytes)", blob.bytes.len());
                let part = Part::bytes(blob.bytes)
                    .file_name(blob.file_name)
                    .mime_str(&blob.mime_type)?;
                form.part("audio_file", part)
            }
        };
        self.post_turn_form("chat", form).await
    }

    async fn send_report_request(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackReport, ProtocolError> {
        let resp = self
            .client
            .post(self.url("generate-feedback"))
            .json(request)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        let body: serde_json::Value = resp.json().await?;
        if let Some(error) = body.get("error") {
            let reason = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
            return Err(ProtocolError::Rejected(reason));
        }
        let report: FeedbackReport = serde_json::from_value(body)
            .map_err(|e| ProtocolError::MalformedResponse(format!("report: {e}")))?;
        Ok(report.clamped())
    }

    async fn list_history(&self) -> Result<Vec<HistoryRecord>, ProtocolError> {
        let resp = self.client.get(self.url("history")).send().await?;
        let resp = Self::check_status(resp).await?;
        Ok(resp.json::<Vec<HistoryRecord>>().await?)
    }
}

use crate::error::{ProtocolError, SessionError};
use crate::model::ResumeProfile;
use crate::protocol::TurnProtocol;
use std::path::Path;

/// Reads a resume file and has the service extract its text.
///
/// Any answer from the service that yields no text is a parse failure, whatever
/// its status. Only an unreachable service is reported as a network failure.
pub async fn load_resume<P: TurnProtocol + ?Sized>(
    protocol: &P,
    path: &Path,
) -> Result<ResumeProfile, SessionError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SessionError::ResumeParseFailure(format!("{}: {e}", path.display())))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume.pdf".to_string());

    tracing::info!("Extracting resume text from {}", file_name);
    let text = protocol
        .extract_resume(&file_name, bytes)
        .await
        .map_err(|e| match e {
            ProtocolError::NetworkFailure(_) => SessionError::NetworkFailure(e),
            ProtocolError::Rejected(detail) | ProtocolError::MalformedResponse(detail) => {
                SessionError::ResumeParseFailure(detail)
            }
        })?;

    let profile = ResumeProfile::new(text);
    if profile.text().is_none() {
        return Err(SessionError::ResumeParseFailure(format!(
            "no text could be extracted from {file_name}"
        )));
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MockTurnProtocol;
    use std::io::Write;

    fn resume_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_resume_uploads_file_bytes() {
        let file = resume_file(b"%PDF-1.4 fake");
        let expected_name = file.path().file_name().unwrap().to_string_lossy().into_owned();

        let mut protocol = MockTurnProtocol::new();
        protocol
            .expect_extract_resume()
            .withf(move |name, bytes| name.ends_with(".pdf") && *name == expected_name && bytes.starts_with(b"%PDF"))
            .times(1)
            .returning(|_, _| Ok("Jane Doe\nRust engineer".to_string()));

        let profile = load_resume(&protocol, file.path()).await.unwrap();
        assert_eq!(profile.text(), Some("Jane Doe\nRust engineer"));
    }

    #[tokio::test]
    async fn test_blank_extraction_is_a_parse_failure() {
        let file = resume_file(b"scanned image only");
        let mut protocol = MockTurnProtocol::new();
        protocol
            .expect_extract_resume()
            .returning(|_, _| Ok("  \n ".to_string()));

        let err = load_resume(&protocol, file.path()).await.unwrap_err();
        assert!(matches!(err, SessionError::ResumeParseFailure(_)));
    }

    #[tokio::test]
    async fn test_rejected_extraction_is_a_parse_failure() {
        let file = resume_file(b"not a pdf");
        let mut protocol = MockTurnProtocol::new();
        protocol
            .expect_extract_resume()
            .returning(|_, _| Err(ProtocolError::Rejected("Invalid PDF".into())));

        let err = load_resume(&protocol, file.path()).await.unwrap_err();
        assert!(matches!(err, SessionError::ResumeParseFailure(ref d) if d == "Invalid PDF"));
    }

    #[tokio::test]
    async fn test_malformed_extraction_is_a_parse_failure() {
        let file = resume_file(b"%PDF");
        let mut protocol = MockTurnProtocol::new();
        protocol
            .expect_extract_resume()
            .returning(|_, _| Err(ProtocolError::MalformedResponse("missing resume_text".into())));

        let err = load_resume(&protocol, file.path()).await.unwrap_err();
        assert!(matches!(err, SessionError::ResumeParseFailure(_)));
        assert!(!err.is_network());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_a_network_failure() {
        let file = resume_file(b"%PDF");
        let mut protocol = MockTurnProtocol::new();
        protocol
            .expect_extract_resume()
            .returning(|_, _| Err(ProtocolError::NetworkFailure("connection refused".into())));

        let err = load_resume(&protocol, file.path()).await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_missing_file_never_reaches_the_service() {
        let dir = tempfile::tempdir().unwrap();
        let protocol = MockTurnProtocol::new();

        let err = load_resume(&protocol, &dir.path().join("missing.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ResumeParseFailure(_)));
    }
}

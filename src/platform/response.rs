use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::SendError;
use crate::retry::RetryPolicy;

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default = "default_ok")]
    ok: bool,
    error_code: Option<i64>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

fn default_ok() -> bool {
    true
}

/// Turn an HTTP status and body into the typed send result.
///
/// `parameters.retry_after` wins; a 429 without it falls back to the
/// description, and any other failure description still goes through the
/// rate-limit classifier so "Retry in N" texts are honored.
pub(super) fn interpret(
    status: StatusCode,
    body: &str,
    classifier: &RetryPolicy,
) -> Result<(), SendError> {
    let envelope = serde_json::from_str::<ApiEnvelope>(body).ok();

    if status.is_success() && envelope.as_ref().is_some_and(|e| e.ok) {
        return Ok(());
    }

    let Some(envelope) = envelope else {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limited(classifier, body));
        }
        return Err(if status.is_success() {
            SendError::fatal(format!("unparseable response: {body}"))
        } else {
            classifier.to_send_error(&format!("status={status}, body={body}"))
        });
    };

    if let Some(wait_secs) = envelope.parameters.and_then(|p| p.retry_after) {
        return Err(SendError::RateLimited { wait_secs });
    }

    let description = envelope
        .description
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| body.to_string());

    if status == StatusCode::TOO_MANY_REQUESTS || envelope.error_code == Some(429) {
        return Err(rate_limited(classifier, &description));
    }

    Err(match classifier.to_send_error(&description) {
        SendError::Fatal { detail } => match envelope.error_code {
            Some(code) => SendError::fatal(format!("error_code={code}, {detail}")),
            None => SendError::fatal(detail),
        },
        rate_limited => rate_limited,
    })
}

fn rate_limited(classifier: &RetryPolicy, description: &str) -> SendError {
    let directive = classifier.classify(description);
    let wait_secs = if directive.retryable {
        directive.wait_secs
    } else {
        classifier.default_wait_secs()
    };
    SendError::RateLimited { wait_secs }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpret_default(status: u16, body: &str) -> Result<(), SendError> {
        interpret(
            StatusCode::from_u16(status).unwrap(),
            body,
            &RetryPolicy::default(),
        )
    }

    #[test]
    fn test_ok_response() {
        assert!(interpret_default(200, r#"{"ok":true,"result":{}}"#).is_ok());
    }

    #[test]
    fn test_ok_false_is_an_error() {
        let err = interpret_default(200, r#"{"ok":false,"description":"nope"}"#).unwrap_err();
        assert_eq!(err, SendError::fatal("nope"));
    }

    #[test]
    fn test_retry_after_parameter() {
        let body = r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 14","parameters":{"retry_after":14}}"#;
        assert_eq!(
            interpret_default(429, body),
            Err(SendError::RateLimited { wait_secs: 14 })
        );
    }

    #[test]
    fn test_429_without_parameters_reads_description() {
        let body = r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 6"}"#;
        assert_eq!(
            interpret_default(429, body),
            Err(SendError::RateLimited { wait_secs: 6 })
        );
    }

    #[test]
    fn test_429_with_opaque_body_uses_default_wait() {
        assert_eq!(
            interpret_default(429, "slow down"),
            Err(SendError::RateLimited { wait_secs: 5 })
        );
    }

    #[test]
    fn test_textual_retry_in_is_rate_limited() {
        let body = r#"{"ok":false,"error_code":400,"description":"Flood control exceeded. Retry in 9 seconds"}"#;
        assert_eq!(
            interpret_default(400, body),
            Err(SendError::RateLimited { wait_secs: 9 })
        );
    }

    #[test]
    fn test_plain_failure_is_fatal() {
        let body = r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#;
        assert_eq!(
            interpret_default(400, body),
            Err(SendError::fatal("error_code=400, Bad Request: chat not found"))
        );
    }

    #[test]
    fn test_success_status_with_garbage_body_is_fatal() {
        let err = interpret_default(200, "<html>").unwrap_err();
        assert!(matches!(err, SendError::Fatal { .. }));
    }
}

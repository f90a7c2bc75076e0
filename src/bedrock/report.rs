//! Human-readable guidance for Bedrock failures.
//!
//! Pure mapping from typed errors to text the CLI prints. Every recognized
//! error gets concrete guidance; anything else falls through to a generic
//! message that still names the underlying error.

use super::client::BedrockError;

/// Describe an error with actionable guidance.
///
/// Total over `BedrockError`: always returns a non-empty string.
pub fn describe(error: &BedrockError) -> String {
    match error {
        BedrockError::MissingCredentials => "AWS credentials are not configured.\n\n\
            Add your credentials to a .env file in the project directory:\n\
                AWS_ACCESS_KEY_ID=your-access-key-id\n\
                AWS_SECRET_ACCESS_KEY=your-secret-access-key\n\n\
            Or export them in your shell before running nova-clip.\n\
            Run 'nova-clip setup' to create a .env template."
            .to_string(),

        BedrockError::Throttled {
            message,
            retry_after_secs,
        } => {
            let wait_hint = match retry_after_secs {
                Some(secs) => format!("Wait at least {} seconds before retrying.", secs),
                None => "Wait a little and retry, or reduce how often you call the API.".to_string(),
            };
            format!(
                "The request was throttled by Bedrock: {}\n{}",
                message, wait_hint
            )
        }

        BedrockError::AccessDenied { message } => format!(
            "Access denied: {}\n\
            Check that your IAM user has bedrock:InvokeModel permission and\n\
            that access to the model has been granted in the Bedrock console.",
            message
        ),

        BedrockError::InvalidInput { message } => format!(
            "The service rejected the request: {}\n\
            Check the prompt, duration, and quality parameters.",
            message
        ),

        BedrockError::NotFound { message } => format!(
            "Model or resource not found: {}\n\
            Check the model id and that the model is available in your region.",
            message
        ),

        BedrockError::QuotaExceeded { message } => format!(
            "Service quota exceeded: {}\n\
            Request a quota increase in the AWS console, or wait for\n\
            in-flight jobs to finish.",
            message
        ),

        BedrockError::Unavailable { message } => format!(
            "The service is currently unavailable: {}\n\
            This is usually temporary. Retry in a few minutes.",
            message
        ),

        BedrockError::Timeout => "The generation job did not finish within the wait timeout.\n\
            The job may still be running server-side. Retry with a longer\n\
            --timeout-secs, or try a shorter duration."
            .to_string(),

        BedrockError::MissingJobId => "The service accepted the request but returned no job id.\n\
            This usually means the model does not support asynchronous video\n\
            generation. Check the model id."
            .to_string(),

        BedrockError::Http(err) => format!(
            "Could not reach the Bedrock endpoint: {}\n\
            Check your network connection and the configured region.",
            err
        ),

        BedrockError::Io(err) => format!("A local file operation failed: {}", err),

        BedrockError::Validation(err) => err.to_string(),

        other => format!("Unexpected error: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bedrock::request::ValidationError;

    fn recognized_errors() -> Vec<BedrockError> {
        vec![
            BedrockError::MissingCredentials,
            BedrockError::Throttled {
                message: "rate exceeded".to_string(),
                retry_after_secs: Some(30),
            },
            BedrockError::Throttled {
                message: "rate exceeded".to_string(),
                retry_after_secs: None,
            },
            BedrockError::AccessDenied {
                message: "no model access".to_string(),
            },
            BedrockError::InvalidInput {
                message: "duration out of range".to_string(),
            },
            BedrockError::NotFound {
                message: "no such model".to_string(),
            },
            BedrockError::QuotaExceeded {
                message: "limit reached".to_string(),
            },
            BedrockError::Unavailable {
                message: "try later".to_string(),
            },
            BedrockError::Timeout,
            BedrockError::MissingJobId,
            BedrockError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
            BedrockError::Validation(ValidationError::EmptyPrompt),
            BedrockError::Api {
                code: "SomethingNewException".to_string(),
                message: "unmapped".to_string(),
            },
        ]
    }

    #[test]
    fn describe_is_total_and_non_empty() {
        for error in recognized_errors() {
            let text = describe(&error);
            assert!(!text.trim().is_empty(), "empty guidance for {:?}", error);
        }
    }

    #[test]
    fn throttle_guidance_includes_retry_after() {
        let text = describe(&BedrockError::Throttled {
            message: "slow down".to_string(),
            retry_after_secs: Some(12),
        });
        assert!(text.contains("12 seconds"));
    }

    #[test]
    fn unknown_error_falls_through_with_code() {
        let text = describe(&BedrockError::Api {
            code: "MysteryException".to_string(),
            message: "???".to_string(),
        });
        assert!(text.contains("MysteryException"));
    }

    #[test]
    fn missing_credentials_mentions_setup() {
        let text = describe(&BedrockError::MissingCredentials);
        assert!(text.contains("AWS_ACCESS_KEY_ID"));
        assert!(text.contains("nova-clip setup"));
    }
}

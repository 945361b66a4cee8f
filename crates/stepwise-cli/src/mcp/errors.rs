//! Error handling utilities for MCP server

use rmcp::ErrorData;
use stepwise_core::GuideError;

/// Converts guide errors to MCP errors. Errors caused by the request itself
/// are reported as invalid parameters so the client can correct them.
pub fn to_mcp_error(message: &str, error: &GuideError) -> ErrorData {
    let text = format!("{message}: {error}");
    match error {
        GuideError::InvalidInput { .. }
        | GuideError::InvalidCondition { .. }
        | GuideError::InvalidBranchTarget { .. }
        | GuideError::ProblemNotFound { .. }
        | GuideError::SessionNotFound { .. }
        | GuideError::SessionTerminated { .. } => ErrorData::invalid_params(text, None),
        _ => ErrorData::internal_error(text, None),
    }
}

#[cfg(test)]
mod tests {
    use rmcp::model::ErrorCode;

    use super::*;

    #[test]
    fn test_request_errors_are_invalid_params() {
        let err = to_mcp_error(
            "Failed to submit action",
            &GuideError::SessionTerminated {
                session_id: "abc".to_string(),
            },
        );
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("Session 'abc' has already terminated"));

        let err = to_mcp_error(
            "Failed to list problems",
            &GuideError::Configuration {
                message: "Task join error".to_string(),
            },
        );
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    }
}

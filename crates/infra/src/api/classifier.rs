//! Graph API error classification
//!
//! Maps a non-success response (body text plus HTTP status) to an
//! [`ApiError`]. The platform reports failures as
//!
//! ```json
//! {"error": {"message": "...", "type": "OAuthException", "code": 17,
//!            "error_subcode": 2446079, "error_user_msg": "...",
//!            "fbtrace_id": "..."}}
//! ```
//!
//! Classification never fails: a body that is not JSON becomes
//! [`ErrorKind::ProtocolError`] carrying the raw text.

use std::time::Duration;

use adreach_domain::constants::{
    CODE_ACCESS_TOKEN, CODE_API_TOO_MANY_CALLS, CODE_APP_CALL_LIMIT, CODE_INVALID_PARAMETER,
    CODE_PERMISSION, CODE_PERMISSION_DENIED, CODE_USER_CALL_LIMIT, HINT_ADS_INSIGHTS_LIMIT,
    HINT_APP_ACCOUNT_LIMIT, HINT_USER_REQUEST_LIMIT, SUBCODE_ADS_INSIGHTS_LIMIT,
    SUBCODE_APP_ACCOUNT_LIMIT, SUBCODE_APP_ACCOUNT_LIMIT_ALT, SUBCODE_USER_REQUEST_LIMIT,
};
use adreach_domain::{ApiError, ErrorKind};
use serde_json::Value;

#[derive(Debug, Default)]
struct GraphErrorBody {
    message: Option<String>,
    error_type: Option<String>,
    code: Option<i64>,
    error_subcode: Option<i64>,
    error_user_msg: Option<String>,
    fbtrace_id: Option<String>,
}

impl GraphErrorBody {
    /// Each field is read on its own, so one mistyped field does not hide
    /// the rest of the envelope.
    fn from_value(error: &Value) -> Self {
        match error {
            Value::String(message) => Self { message: Some(message.clone()), ..Self::default() },
            Value::Object(_) => Self {
                message: text(error, "message"),
                error_type: text(error, "type"),
                code: number(error, "code"),
                error_subcode: number(error, "error_subcode"),
                error_user_msg: text(error, "error_user_msg"),
                fbtrace_id: text(error, "fbtrace_id"),
            },
            _ => Self::default(),
        }
    }
}

fn text(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Integer field; numeric strings such as `"190"` are accepted too
fn number(obj: &Value, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Kind and cool-down hint for a code/subcode pair.
///
/// Subcode matches take precedence over bare codes.
pub fn kind_for(
    code: Option<i64>,
    subcode: Option<i64>,
    http_status: u16,
) -> (ErrorKind, Option<Duration>) {
    match (code, subcode) {
        (Some(CODE_USER_CALL_LIMIT), Some(SUBCODE_USER_REQUEST_LIMIT)) => {
            (ErrorKind::RateLimited, Some(HINT_USER_REQUEST_LIMIT))
        }
        (Some(CODE_API_TOO_MANY_CALLS), Some(SUBCODE_ADS_INSIGHTS_LIMIT)) => {
            (ErrorKind::RateLimited, Some(HINT_ADS_INSIGHTS_LIMIT))
        }
        (
            Some(CODE_APP_CALL_LIMIT),
            Some(SUBCODE_APP_ACCOUNT_LIMIT | SUBCODE_APP_ACCOUNT_LIMIT_ALT),
        ) => (ErrorKind::RateLimited, Some(HINT_APP_ACCOUNT_LIMIT)),
        (Some(CODE_ACCESS_TOKEN), _) => (ErrorKind::Authentication, None),
        (Some(CODE_PERMISSION | CODE_PERMISSION_DENIED), _) => (ErrorKind::Permission, None),
        (Some(CODE_INVALID_PARAMETER), _) => (ErrorKind::Validation, None),
        (Some(CODE_APP_CALL_LIMIT), _) => (ErrorKind::ApplicationCallLimit, None),
        (Some(CODE_USER_CALL_LIMIT), _) => (ErrorKind::UserCallLimit, None),
        _ if http_status >= 500 => (ErrorKind::ServerError, None),
        _ => (ErrorKind::Unknown, None),
    }
}

/// Classify a failed response.
pub fn classify(body: &str, http_status: u16) -> ApiError {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return ApiError::protocol(body, Some(http_status));
    };

    let detail = value.get("error").map(GraphErrorBody::from_value).unwrap_or_default();

    let (kind, hint) = kind_for(detail.code, detail.error_subcode, http_status);

    let message = detail
        .error_user_msg
        .filter(|m| !m.is_empty())
        .or(detail.message)
        .unwrap_or_else(|| body.to_string());

    let mut error = ApiError::new(kind, message)
        .with_status(http_status)
        .with_codes(detail.code, detail.error_subcode);
    error.retry_after = hint;
    if let Some(trace) = detail.fbtrace_id {
        error = error.with_trace_id(trace);
    }
    if let Some(error_type) = detail.error_type {
        error = error.with_error_type(error_type);
    }
    error
}

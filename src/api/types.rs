//! Request and response shapes the shell exchanges with the BizFlow server.
//!
//! All structs use camelCase serialization to match the API's JSON format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;

/// A file stored by the upload endpoint, referenced by later API calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFileRef {
    pub file_id: String,
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub description: String,
}

/// Response from the multipart upload endpoint.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub data: Vec<UploadedFileRef>,
}

/// Pull `data.sessionKey` out of a successful login response.
///
/// Returns `Ok(None)` when the login did not succeed or carried no key.
pub fn session_key_from_login(body: &str) -> Result<Option<String>, DecodeError> {
    let root: Value = serde_json::from_str(body).map_err(|e| DecodeError::new(e, body))?;
    if root.get("success").and_then(Value::as_bool) != Some(true) {
        return Ok(None);
    }
    Ok(root
        .pointer("/data/sessionKey")
        .and_then(Value::as_str)
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_session_key_from_successful_login() {
        let body = r#"{"success":true,"data":{"sessionKey":"tok-1","name":"Admin"}}"#;
        assert_eq!(session_key_from_login(body).unwrap().as_deref(), Some("tok-1"));
    }

    #[test]
    fn failed_login_has_no_session_key() {
        let body = r#"{"success":false,"data":{"sessionKey":"ignored"},"message":"bad password"}"#;
        assert_eq!(session_key_from_login(body).unwrap(), None);
        assert_eq!(session_key_from_login(r#"{"success":true,"data":{}}"#).unwrap(), None);
    }

    #[test]
    fn non_json_login_body_keeps_raw_text() {
        let err = session_key_from_login("<html>502</html>").unwrap_err();
        assert_eq!(err.raw, "<html>502</html>");
    }

    #[test]
    fn upload_response_defaults_missing_description() {
        let parsed: UploadResponse = serde_json::from_str(
            r#"{"success":true,"data":[{"fileId":"F1","name":"hello.txt","size":11}]}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.data,
            vec![UploadedFileRef {
                file_id: "F1".into(),
                name: "hello.txt".into(),
                size: 11,
                description: String::new(),
            }]
        );
    }

    #[test]
    fn upload_response_requires_file_id() {
        let result: Result<UploadResponse, _> =
            serde_json::from_str(r#"{"success":true,"data":[{"name":"a","size":1}]}"#);
        assert!(result.is_err());
    }
}

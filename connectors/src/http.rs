//! Shared response handling for connector HTTP calls.

use serde_json::Value;

use crate::errors::connector_error::ConnectorError;

/// Checks the status and decodes the body as JSON, keeping a short body
/// snippet in the error on failure.
pub(crate) async fn expect_json(
    resp: reqwest::Response,
    source_name: &'static str,
) -> Result<Value, ConnectorError> {
    let status = resp.status();
    let url = resp.url().to_string();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(240).collect();
        return Err(ConnectorError::HttpStatus {
            status,
            url,
            snippet,
        });
    }
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| ConnectorError::Decode {
        source_name,
        message: e.to_string(),
    })
}

pub(crate) fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

use gloo_net::http::Request;
use tracing::trace;

use streaming::{ApiCall, ApiError, Reply};

/// `POST` target for an endpoint. An empty base means same-origin.
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), endpoint)
}

/// Performs one backend call. Fields go in the query string; the body of the
/// response is decoded according to the call.
pub async fn perform(base_url: &str, call: &ApiCall) -> Result<Reply, ApiError> {
    let url = endpoint_url(base_url, call.endpoint());
    let params = call.params();
    trace!(%url, ?params, "POST");

    let resp = Request::post(&url)
        .query(params.iter().map(|(k, v)| (*k, v.as_str())))
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    let body = resp
        .text()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    call.decode(&body)
}

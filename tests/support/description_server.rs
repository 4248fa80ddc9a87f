//! Wiremock stand-in for the GitHub issue endpoint that backs a pull
//! request description.

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Owner used in every stubbed pull request URL.
pub const OWNER: &str = "owner";
/// Repository used in every stubbed pull request URL.
pub const REPOSITORY: &str = "repo";

/// API path of the issue behind pull request `number`.
pub fn issue_path(number: u64) -> String {
    format!("/api/v3/repos/{OWNER}/{REPOSITORY}/issues/{number}")
}

/// Pull request page URL on the mock server.
pub fn pull_request_url(server: &MockServer, number: u64) -> String {
    format!("{}/{OWNER}/{REPOSITORY}/pull/{number}", server.uri())
}

/// Serves `body` as the description and accepts updates to it.
pub async fn serve_description(server: &MockServer, number: u64, body: &str) {
    Mock::given(method("GET"))
        .and(path(issue_path(number)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": number,
            "body": body,
        })))
        .mount(server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(issue_path(number)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": number,
            "body": null,
        })))
        .mount(server)
        .await;
}

/// Answers every request for the issue with `status`.
pub async fn reject_with(server: &MockServer, number: u64, status: u16, message: &str) {
    Mock::given(path(issue_path(number)))
        .respond_with(
            ResponseTemplate::new(status).set_body_json(json!({ "message": message })),
        )
        .mount(server)
        .await;
}

/// Description bodies sent with PATCH requests, oldest first.
pub async fn written_bodies(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == "PATCH")
        .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
        .filter_map(|payload| payload.get("body").and_then(Value::as_str).map(str::to_owned))
        .collect()
}

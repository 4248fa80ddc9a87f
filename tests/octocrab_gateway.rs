//! Octocrab gateway behaviour against a Wiremock GitHub API.

mod support;

use rstest::rstest;
use storyline::{
    GithubError, HostTextGateway, OctocrabGateway, PersonalAccessToken, PullRequestLocator,
};
use support::description_server::{
    pull_request_url, reject_with, serve_description, written_bodies,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_for(server: &MockServer, number: u64) -> OctocrabGateway {
    let locator =
        PullRequestLocator::parse(&pull_request_url(server, number)).expect("locator parses");
    let token = PersonalAccessToken::new("test-token").expect("token accepted");
    OctocrabGateway::for_token(&token, &locator).expect("gateway builds")
}

#[tokio::test]
async fn reads_and_writes_the_issue_body() {
    let server = MockServer::start().await;
    serve_description(&server, 3, "Original body").await;
    let gateway = gateway_for(&server, 3);

    let text = gateway.fetch_host_text().await.expect("fetch succeeds");
    gateway
        .write_host_text("Updated body")
        .await
        .expect("write succeeds");

    assert_eq!(text, "Original body");
    assert_eq!(written_bodies(&server).await, vec!["Updated body".to_owned()]);
}

#[tokio::test]
async fn missing_body_reads_as_empty_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/repos/owner/repo/issues/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "number": 4,
            "body": null,
        })))
        .mount(&server)
        .await;
    let gateway = gateway_for(&server, 4);

    assert_eq!(gateway.fetch_host_text().await.expect("fetch succeeds"), "");
}

#[rstest]
#[case::unauthorised(401)]
#[case::forbidden(403)]
#[tokio::test]
async fn rejected_credentials_map_to_authentication(#[case] status: u16) {
    let server = MockServer::start().await;
    reject_with(&server, 5, status, "Bad credentials").await;
    let gateway = gateway_for(&server, 5);

    let error = gateway
        .fetch_host_text()
        .await
        .expect_err("request is rejected");

    assert!(
        matches!(error, GithubError::Authentication { .. }),
        "unexpected error {error:?}"
    );
}

#[rstest]
#[case::not_found(404)]
#[case::server_error(500)]
#[tokio::test]
async fn other_failures_map_to_api_errors(#[case] status: u16) {
    let server = MockServer::start().await;
    reject_with(&server, 6, status, "Something went wrong").await;
    let gateway = gateway_for(&server, 6);

    let error = gateway
        .write_host_text("body")
        .await
        .expect_err("request fails");

    assert!(
        matches!(error, GithubError::Api { .. }),
        "unexpected error {error:?}"
    );
}

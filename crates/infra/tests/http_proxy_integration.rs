//! Proxy settings from the environment are honoured
//!
//! Kept in its own test binary: it changes process-wide proxy variables.

use adreach_infra::HttpClient;
use reqwest::Method;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_requests_go_through_environment_proxy() {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v23.0/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"me"}"#))
        .expect(1)
        .mount(&proxy)
        .await;

    for var in ["NO_PROXY", "no_proxy", "ALL_PROXY", "all_proxy", "http_proxy"] {
        std::env::remove_var(var);
    }
    std::env::set_var("HTTP_PROXY", proxy.uri());

    let client = HttpClient::new().unwrap();
    std::env::remove_var("HTTP_PROXY");

    let response = client
        .send(client.request(Method::GET, "http://graph.adreach.invalid/v23.0/me"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"id":"me"}"#);
}

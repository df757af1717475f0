//! Azure OpenAI connector tests against a mock HTTP backend

use connector_gateway::backend::AzureOpenAiConnector;
use connector_gateway::connector::{Connector, ConnectorEndpointArguments};
use connector_gateway::error::ConnectorError;
use reqwest::StatusCode;
use serde_json::{json, Map};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn arguments(server_uri: &str) -> ConnectorEndpointArguments {
    let mut params = Map::new();
    // Pin the version so the test does not depend on the environment
    params.insert("api_version".to_string(), json!("2024-02-01"));

    ConnectorEndpointArguments {
        endpoint: server_uri.to_string(),
        token: Some("test-key".to_string()),
        model: "gpt-4o".to_string(),
        timeout_secs: 5,
        num_of_retries: 2,
        optional_params: params,
        ..Default::default()
    }
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ]
    })
}

#[tokio::test]
async fn returns_first_choice_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o/chat/completions"))
        .and(query_param("api-version", "2024-02-01"))
        .and(header("api-key", "test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "messages": [{ "role": "user", "content": "hi" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("hello")))
        .expect(1)
        .mount(&server)
        .await;

    let connector = AzureOpenAiConnector::new(arguments(&server.uri())).unwrap();
    let response = connector.get_response("hi").await.unwrap();

    assert_eq!(response.response, "hello");
}

#[tokio::test]
async fn optional_params_are_merged_and_required_params_win() {
    let server = MockServer::start().await;

    let mut args = arguments(&server.uri());
    args.optional_params
        .insert("temperature".to_string(), json!(0.2));
    // A caller-supplied model must lose against the configured one
    args.optional_params
        .insert("model".to_string(), json!("other-model"));

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "temperature": 0.2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let connector = AzureOpenAiConnector::new(args).unwrap();
    connector.get_response("hi").await.unwrap();
}

#[tokio::test]
async fn content_filter_rejection_becomes_a_normal_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "The prompt triggered the content management policy.",
                "innererror": { "code": "ResponsibleAIPolicyViolation" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = AzureOpenAiConnector::new(arguments(&server.uri())).unwrap();
    let response = connector.get_response("hi").await.unwrap();

    // Treated as model output, with zero retry attempts (expect(1) above)
    assert_eq!(
        response.response,
        "The prompt triggered the content management policy."
    );
}

#[tokio::test]
async fn transient_errors_are_retried_until_exhaustion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(3)
        .mount(&server)
        .await;

    let connector = AzureOpenAiConnector::new(arguments(&server.uri())).unwrap();
    let result = connector.get_response("hi").await;

    match result {
        Err(ConnectorError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn recovers_when_a_retry_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("recovered")))
        .expect(1)
        .mount(&server)
        .await;

    let connector = AzureOpenAiConnector::new(arguments(&server.uri())).unwrap();
    let response = connector.get_response("hi").await.unwrap();

    assert_eq!(response.response, "recovered");
}

#[tokio::test]
async fn authentication_failures_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let connector = AzureOpenAiConnector::new(arguments(&server.uri())).unwrap();
    let result = connector.get_response("hi").await;

    assert!(matches!(
        result,
        Err(ConnectorError::Backend {
            status: StatusCode::UNAUTHORIZED,
            ..
        })
    ));
}

#[tokio::test]
async fn system_prompt_is_sent_ahead_of_the_user_message() {
    let server = MockServer::start().await;

    let mut args = arguments(&server.uri());
    args.system_prompt = Some("You are terse.".to_string());
    args.pre_prompt = "Q: ".to_string();

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system", "content": "You are terse." },
                { "role": "user", "content": "Q: hi" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let connector = AzureOpenAiConnector::new(args).unwrap();
    connector.get_response("hi").await.unwrap();
}

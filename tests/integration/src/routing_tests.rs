//! Backend resolution from the environment, exercised over the wire

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use completion_gateway::{BackendFamily, Gateway, GatewayEnv, GatewayError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_azure_deployment_routing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o/chat/completions"))
        .and(query_param("api-version", "2024-06-01"))
        .and(header("api-key", "azure-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_chat_response("from azure")))
        .expect(1)
        .mount(&server)
        .await;

    let env = GatewayEnv::default()
        .with_var("AZURE_OPENAI", "1")
        .with_var(
            "AZURE_OPENAI_gpt_4o_ENDPOINT",
            format!("{}?api-version=2024-06-01", server.uri()),
        )
        .with_var("AZURE_OPENAI_gpt_4o_API_KEY", "azure-key");
    let gateway = gateway_builder("gpt-4o", env).build().unwrap();
    assert_eq!(gateway.family(), BackendFamily::OpenAI);

    let result = gateway.complete(&simple_request("Hi")).await.unwrap();
    assert_eq!(result.as_text(), Some("from azure"));
}

#[tokio::test]
async fn test_azure_requires_endpoint() {
    let env = GatewayEnv::default()
        .with_var("AZURE_OPENAI", "1")
        .with_var("AZURE_OPENAI_gpt_4o_API_KEY", "azure-key");

    let err = gateway_builder("gpt-4o", env).build().unwrap_err();
    match err {
        GatewayError::Configuration { message } => {
            assert!(message.contains("AZURE_OPENAI_gpt_4o_ENDPOINT"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_local_model_routing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(OPENAI_COMPLETIONS_PATH))
        .and(header("authorization", "Bearer not-needed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_chat_response("from local")))
        .expect(1)
        .mount(&server)
        .await;

    let env = GatewayEnv::default().with_var("LOCAL_MODEL_API_BASE", format!("{}/v1", server.uri()));
    let gateway = gateway_builder("llama-3-8b-instruct", env).build().unwrap();

    let result = gateway.complete(&simple_request("Hi")).await.unwrap();
    assert_eq!(result.as_text(), Some("from local"));
}

#[tokio::test]
async fn test_gpt_models_skip_local_base() {
    let local = MockOpenAI::new().await;
    local.mock_chat_completion("from local").await;
    let openai = MockOpenAI::new().await;
    openai.mock_chat_completion("from openai").await;

    let env = openai_env(&openai).with_var("LOCAL_MODEL_API_BASE", local.base_url());
    let gateway = gateway_builder("gpt-4o", env).build().unwrap();

    let result = gateway.complete(&simple_request("Hi")).await.unwrap();
    assert_eq!(result.as_text(), Some("from openai"));
    assert!(local.request_bodies().await.is_empty());
}

#[tokio::test]
async fn test_claude_takes_precedence_over_local_base() {
    let local = MockOpenAI::new().await;
    let anthropic = MockAnthropic::new().await;
    anthropic.mock_messages("from anthropic").await;

    let env = anthropic_env(&anthropic).with_var("LOCAL_MODEL_API_BASE", local.base_url());
    let gateway = gateway_builder("claude-3-haiku", env).build().unwrap();
    assert_eq!(gateway.family(), BackendFamily::Anthropic);

    let result = gateway.complete(&simple_request("Hi")).await.unwrap();
    assert_eq!(result.as_text(), Some("from anthropic"));
    assert!(local.request_bodies().await.is_empty());
}

#[tokio::test]
async fn test_missing_credentials() {
    for model in ["claude-3-opus", "gpt-4o"] {
        let err = Gateway::builder(model)
            .env(GatewayEnv::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration { .. }), "{model}");
    }
}

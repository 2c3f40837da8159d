//! HTTP-level tests for the model client and the openFDA directory,
//! against a wiremock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rxresolve::{
    CompletionRequest, DrugDirectory, ModelClient, OpenAiCompatClient, OpenFdaDirectory, RxError,
};

fn completion_request(prompt: &str) -> CompletionRequest {
    CompletionRequest {
        system_prompt: Some("You are a clinical assistant.".to_string()),
        user_prompt: prompt.to_string(),
        max_tokens: 500,
        temperature: 0.2,
        timeout: Duration::from_secs(10),
    }
}

#[tokio::test]
async fn chat_completion_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "[\"metformin\", \"semaglutide\"]"}
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OpenAiCompatClient::with_base_url("test_key", "gpt-4o-mini", mock_server.uri());
    let text = client
        .complete(&completion_request("List drugs"))
        .await
        .unwrap();

    assert_eq!(text, "[\"metformin\", \"semaglutide\"]");
}

#[tokio::test]
async fn chat_completion_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&mock_server)
        .await;

    let client = OpenAiCompatClient::with_base_url("bad_key", "gpt-4o-mini", mock_server.uri());
    let error = client
        .complete(&completion_request("List drugs"))
        .await
        .unwrap_err();

    assert!(matches!(error, RxError::AuthenticationFailed));
}

#[tokio::test]
async fn chat_completion_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let client = OpenAiCompatClient::with_base_url("test_key", "gpt-4o-mini", mock_server.uri());
    let error = client
        .complete(&completion_request("List drugs"))
        .await
        .unwrap_err();

    assert!(matches!(error, RxError::RateLimited { .. }));
}

#[tokio::test]
async fn chat_completion_server_error_carries_status_and_sample() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let client = OpenAiCompatClient::with_base_url("test_key", "gpt-4o-mini", mock_server.uri());
    let error = client
        .complete(&completion_request("List drugs"))
        .await
        .unwrap_err();

    match error {
        RxError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_completion_empty_content_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "   "}}]
        })))
        .mount(&mock_server)
        .await;

    let client = OpenAiCompatClient::with_base_url("test_key", "gpt-4o-mini", mock_server.uri());
    let error = client
        .complete(&completion_request("List drugs"))
        .await
        .unwrap_err();

    assert!(matches!(error, RxError::EmptyResponse));
}

#[tokio::test]
async fn chat_completion_without_choices_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&mock_server)
        .await;

    let client = OpenAiCompatClient::with_base_url("test_key", "gpt-4o-mini", mock_server.uri());
    let error = client
        .complete(&completion_request("List drugs"))
        .await
        .unwrap_err();

    assert!(matches!(error, RxError::EmptyResponse));
}

#[tokio::test]
async fn chat_completion_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "too late"}}]
                })),
        )
        .mount(&mock_server)
        .await;

    let client = OpenAiCompatClient::with_base_url("test_key", "gpt-4o-mini", mock_server.uri());
    let mut request = completion_request("List drugs");
    request.timeout = Duration::from_millis(100);

    let error = client.complete(&request).await.unwrap_err();
    assert!(matches!(error, RxError::Timeout(_)));
}

fn ndc_body(ndc: &str, brand: &str, generic: &str) -> serde_json::Value {
    json!({
        "results": [{
            "product_ndc": ndc,
            "brand_name": brand,
            "generic_name": generic,
            "dosage_form": "TABLET",
            "active_ingredients": [{"name": generic.to_uppercase(), "strength": "500 mg/1"}]
        }]
    })
}

#[tokio::test]
async fn directory_resolves_a_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drug/ndc.json"))
        .and(query_param_contains("search", "metformin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ndc_body("0093-1048", "Glucophage", "metformin hydrochloride")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let directory = OpenFdaDirectory::with_base_url(mock_server.uri());
    let drug = directory.resolve("metformin").await.unwrap().unwrap();

    assert_eq!(drug.brand_name, "Glucophage");
    assert_eq!(drug.generic_name, "metformin hydrochloride");
    assert_eq!(drug.dosage_form.as_deref(), Some("TABLET"));
    assert_eq!(drug.strength.as_deref(), Some("500 mg/1"));
    assert_eq!(drug.source_id, "0093-1048");
}

#[tokio::test]
async fn directory_treats_404_as_no_match() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drug/ndc.json"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "NOT_FOUND", "message": "No matches found!"}
        })))
        .mount(&mock_server)
        .await;

    let directory = OpenFdaDirectory::with_base_url(mock_server.uri());
    let resolved = directory.resolve("notadrugname").await.unwrap();

    assert!(resolved.is_none());
}

#[tokio::test]
async fn directory_falls_back_to_queried_name_for_missing_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drug/ndc.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"product_ndc": "1234-5678"}]
        })))
        .mount(&mock_server)
        .await;

    let directory = OpenFdaDirectory::with_base_url(mock_server.uri());
    let drug = directory.resolve("metformin").await.unwrap().unwrap();

    // The queried name stands in for absent brand/generic fields.
    assert_eq!(drug.brand_name, "metformin");
    assert_eq!(drug.generic_name, "metformin");
    assert!(drug.dosage_form.is_none());
    assert!(drug.strength.is_none());
}

#[tokio::test]
async fn directory_batch_drops_unresolved_names() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drug/ndc.json"))
        .and(query_param_contains("search", "metformin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ndc_body("0093-1048", "Glucophage", "metformin")),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drug/ndc.json"))
        .and(query_param_contains("search", "lisinopril"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ndc_body("0143-1240", "Prinivil", "lisinopril")),
        )
        .mount(&mock_server)
        .await;
    // Anything else 404s.
    Mock::given(method("GET"))
        .and(path("/drug/ndc.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let directory = OpenFdaDirectory::with_base_url(mock_server.uri());
    let names = vec![
        "metformin".to_string(),
        "unknowndrug".to_string(),
        "lisinopril".to_string(),
    ];
    let enriched = directory.resolve_many(&names).await;

    let brands: Vec<&str> = enriched.iter().map(|d| d.brand_name.as_str()).collect();
    assert_eq!(brands, vec!["Glucophage", "Prinivil"]);
}

#[tokio::test]
async fn directory_batch_survives_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drug/ndc.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let directory = OpenFdaDirectory::with_base_url(mock_server.uri());
    let enriched = directory
        .resolve_many(&["metformin".to_string(), "lisinopril".to_string()])
        .await;

    assert!(enriched.is_empty());
}

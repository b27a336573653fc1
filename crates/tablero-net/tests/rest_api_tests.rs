//! Tests for the REST API client.

use tablero_net::NetworkError;
use tablero_net::http::{HttpMethod, RestApiClient};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_rest_api_client_builder() {
    let client = RestApiClient::builder("https://api.example.com")
        .bearer_auth("my-token")
        .json_api()
        .build()
        .expect("Failed to build client");

    assert_eq!(client.base_url(), "https://api.example.com");
}

#[test]
fn test_rest_api_client_base_url_normalization() {
    let client = RestApiClient::builder("http://localhost:8000/api/")
        .build()
        .expect("Failed to build client");

    assert_eq!(client.base_url(), "http://localhost:8000/api");
}

#[test]
fn test_rest_api_request_builder() {
    let client = RestApiClient::builder("http://localhost:8000/api")
        .bearer_auth("token123")
        .build()
        .expect("Failed to build client");

    let request = client.get("/alertas/").build().unwrap();
    assert_eq!(request.url, "http://localhost:8000/api/alertas/");
    assert_eq!(request.method, HttpMethod::Get);

    let request = client.get("alertas/resumen").build().unwrap();
    assert_eq!(request.url, "http://localhost:8000/api/alertas/resumen");

    let request = client
        .put("/alertas/3/leer")
        .query("nivel", "ROJO")
        .build()
        .unwrap();
    assert_eq!(request.method, HttpMethod::Put);
    assert_eq!(request.query.len(), 1);
}

#[test]
fn test_api_key_auth() {
    let client = RestApiClient::builder("https://api.example.com")
        .api_key("X-API-Key", "secret-key")
        .build()
        .expect("Failed to build client");

    let request = client.get("/users").build().unwrap();
    assert!(request.headers.get("X-API-Key").is_some());
    assert!(request.auth.is_none());
}

#[tokio::test]
async fn test_repeated_query_keys_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/adquisiciones/tabla"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let client = RestApiClient::builder(mock_server.uri())
        .build()
        .expect("Failed to build client");

    let _: serde_json::Value = client
        .get("/adquisiciones/tabla")
        .query_pairs(vec![
            ("estado".to_string(), "CONVOCADO".to_string()),
            ("estado".to_string(), "ADJUDICADO".to_string()),
        ])
        .json_response()
        .await
        .expect("request failed");

    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    let estados: Vec<String> = requests[0]
        .url
        .query_pairs()
        .filter(|(k, _)| k == "estado")
        .map(|(_, v)| v.into_owned())
        .collect();
    assert_eq!(estados, vec!["CONVOCADO", "ADJUDICADO"]);
}

#[tokio::test]
async fn test_bearer_auth_and_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contratos-menores/"))
        .and(header("authorization", "Bearer token123"))
        .and(body_json(serde_json::json!({"descripcion": "Utiles de oficina"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 9, "codigo": "CM-9"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RestApiClient::builder(mock_server.uri())
        .bearer_auth("token123")
        .json_api()
        .build()
        .expect("Failed to build client");

    let created: serde_json::Value = client
        .post("/contratos-menores/")
        .json(&serde_json::json!({"descripcion": "Utiles de oficina"}))
        .json_response()
        .await
        .expect("request failed");
    assert_eq!(created["id"], 9);
}

#[tokio::test]
async fn test_server_error_is_sent_once_and_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("mantenimiento"))
        .mount(&mock_server)
        .await;

    let client = RestApiClient::builder(mock_server.uri())
        .build()
        .expect("Failed to build client");

    let err = client
        .get("/presupuesto/kpis")
        .json_response::<serde_json::Value>()
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.is_transient());
    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no existe"))
        .mount(&mock_server)
        .await;

    let client = RestApiClient::builder(mock_server.uri())
        .build()
        .expect("Failed to build client");

    let err = client
        .get("/maestros/ue/99")
        .json_response::<serde_json::Value>()
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(err.is_client_error());
    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_unserializable_body_is_not_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = RestApiClient::builder(mock_server.uri())
        .build()
        .expect("Failed to build client");

    let mut body = std::collections::HashMap::new();
    body.insert(vec![1u8], "clave no textual");
    let err = client
        .post("/contratos-menores/")
        .json(&body)
        .json_response::<serde_json::Value>()
        .await
        .unwrap_err();
    assert!(matches!(err, NetworkError::Json(_)));
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use job_board_client::{ApiClient, Error, RequestConfig, RequestOptions, SessionHandler};

use crate::support::{config_for, init_logging, token};

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Job {
    id: String,
    title: String,
    company_name: String,
}

#[derive(Default)]
struct CountingSession(AtomicUsize);

impl SessionHandler for CountingSession {
    fn session_expired(&self, login_route: &str) {
        assert_eq!(login_route, "/auth/login");
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn typed_responses_decode_into_caller_types() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/j-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "j-1",
            "title": "Backend Engineer",
            "companyName": "Acme"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(config_for(&server.uri())).unwrap();
    let job: Job = client.get("/jobs/j-1", RequestOptions::new()).await.unwrap();
    assert_eq!(job.title, "Backend Engineer");
    assert_eq!(job.company_name, "Acme");

    let err = client
        .get::<Vec<Job>>("/jobs/j-1", RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_api_error().code, "INVALID_RESPONSE");
}

#[tokio::test]
async fn generic_request_carries_params_and_verbs() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/applications/a-1"))
        .and(query_param("notify", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "reviewed"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/applications/a-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(config_for(&server.uri())).unwrap();
    let updated: Value = client
        .request(
            RequestConfig::new(Method::PATCH, "/applications/a-1")
                .json(json!({"status": "reviewed"}))
                .param("notify", true),
        )
        .await
        .unwrap();
    assert_eq!(updated["status"], "reviewed");

    let deleted: Value = client
        .delete("/applications/a-1", RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(deleted, Value::Null);
}

#[tokio::test]
async fn expired_session_notifies_the_handler_once() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/applications"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let session = Arc::new(CountingSession::default());
    let client =
        ApiClient::with_session_handler(config_for(&server.uri()), session.clone()).unwrap();
    client
        .set_tokens(token("u-9", "job_seeker", 900), "refresh-stale")
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        client.get::<Value>("/jobs", RequestOptions::new()),
        client.get::<Value>("/applications", RequestOptions::new()),
    );
    for err in [a.unwrap_err(), b.unwrap_err()] {
        assert!(
            matches!(err, Error::RefreshFailure(_)) || err.is_unauthorized(),
            "unexpected error: {err:?}"
        );
    }
    assert_eq!(client.access_token().await, None);
    assert_eq!(session.0.load(Ordering::SeqCst), 1);
    assert_eq!(client.refresh_token().await, None);
}

#[tokio::test]
async fn clones_share_cache_and_tokens() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/companies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["acme"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(config_for(&server.uri())).unwrap();
    let clone = client.clone();
    let _: Value = client.get("/companies", RequestOptions::new()).await.unwrap();
    let cached: Value = clone.get("/companies", RequestOptions::new()).await.unwrap();
    assert_eq!(cached, json!(["acme"]));

    client.set_tokens("a", "r").await.unwrap();
    assert_eq!(clone.access_token().await.as_deref(), Some("a"));
}

#[tokio::test]
async fn timeouts_surface_as_network_errors() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(config_for(&server.uri())).unwrap();
    let err = client
        .get::<Value>(
            "/slow",
            RequestOptions::new()
                .timeout(std::time::Duration::from_millis(50))
                .retries(0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
    assert_eq!(err.to_api_error().code, "NETWORK_ERROR");
}


use crate::tests::test_support::config_for;

use super::*;

#[tokio::test]
async fn pipeline_runs_stages_outermost_first() {
    let client = ApiClient::new(config_for("http://localhost:3001/api/v1")).unwrap();
    assert_eq!(
        client.stage_names(),
        vec!["cache", "dedup", "refresh", "retry", "auth"]
    );
}

#[test]
fn client_builds_outside_a_runtime() {
    let client = ApiClient::new(Config::default()).unwrap();
    assert_eq!(client.url_for("/jobs"), "http://localhost:3001/api/v1/jobs");
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ApiClient::new(Config::default().with_base_url("not a url"))
        .err()
        .expect("construction should fail");
    assert!(matches!(err, Error::Config(_)));
}

use std::collections::BTreeMap;

use reqwest::Method;
use serde_json::json;

use job_board_client::cache::request_key;
use job_board_client::{RequestConfig, RequestOptions};

#[test]
fn property_order_does_not_change_the_key() {
    let a = json!({"title": "Engineer", "salary": {"min": 1, "max": 2}, "tags": ["rust"]});
    let b = json!({"tags": ["rust"], "salary": {"max": 2, "min": 1}, "title": "Engineer"});
    let params = BTreeMap::new();
    assert_eq!(
        request_key(&Method::POST, "/jobs", &params, Some(&a)),
        request_key(&Method::POST, "/jobs", &params, Some(&b)),
    );
}

#[test]
fn method_url_params_and_body_all_distinguish() {
    let base = RequestConfig::get("/jobs").with_options(RequestOptions::new().param("page", 1));
    let other_page =
        RequestConfig::get("/jobs").with_options(RequestOptions::new().param("page", 2));
    let other_method = RequestConfig::new(Method::DELETE, "/jobs")
        .with_options(RequestOptions::new().param("page", 1));
    let with_body = RequestConfig::new(Method::POST, "/jobs").json(json!({"page": 1}));

    let keys = [
        base.key().unwrap(),
        other_page.key().unwrap(),
        other_method.key().unwrap(),
        with_body.key().unwrap(),
    ];
    for (i, a) in keys.iter().enumerate() {
        for b in &keys[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn cacheability_follows_method_unless_overridden() {
    assert!(RequestConfig::get("/jobs").is_cacheable());
    assert!(!RequestConfig::new(Method::POST, "/jobs").is_cacheable());
    assert!(
        !RequestConfig::get("/jobs")
            .with_options(RequestOptions::new().cache(false))
            .is_cacheable()
    );
    assert!(
        RequestConfig::new(Method::POST, "/jobs/search")
            .with_options(RequestOptions::new().cache(true))
            .is_cacheable()
    );
}

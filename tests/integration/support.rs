use std::sync::Once;
use std::time::Duration;

use jsonwebtoken::{EncodingKey, Header};
use serde_json::json;

use job_board_client::Config;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub fn config_for(server_uri: &str) -> Config {
    Config::default()
        .with_base_url(server_uri)
        .with_retry(2, Duration::from_millis(5))
}

pub fn token(sub: &str, role: &str, ttl_secs: i64) -> String {
    let now = jiff::Timestamp::now().as_second();
    jsonwebtoken::encode(
        &Header::default(),
        &json!({"sub": sub, "role": role, "iat": now, "exp": now + ttl_secs}),
        &EncodingKey::from_secret(b"integration"),
    )
    .unwrap()
}

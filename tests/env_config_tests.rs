//! Tests for environment-driven endpoint settings
//!
//! `HANDLR_MAX_BODY_BYTES` and `HANDLR_BIND_POLICY` seed every new
//! `EndpointBuilder`; explicit builder settings still win. This binary owns
//! its process environment, so everything runs in a single test.

mod common;

use common::test_router::{request, TestRouter};
use handlr::{BindPolicy, DispatchConfig, Endpoint, JsonWriter, RequestContext, Void};
use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

#[derive(Default, handlr::Params)]
struct ById {
    #[param(path = "id")]
    id: u64,
}

#[derive(Serialize, handlr::Payload)]
struct Found {
    id: u64,
}

fn find(_ctx: &RequestContext, _body: Void, p: ById) -> anyhow::Result<Found> {
    Ok(Found { id: p.id })
}

fn echo(_ctx: &RequestContext, body: Value, _p: Void) -> anyhow::Result<Value> {
    Ok(body)
}

#[test]
fn test_environment_seeds_builder_settings() {
    std::env::set_var("HANDLR_BIND_POLICY", "strict");
    std::env::set_var("HANDLR_MAX_BODY_BYTES", "8");

    let config = DispatchConfig::from_env();
    assert_eq!(config.bind_policy, BindPolicy::Strict);
    assert_eq!(config.max_body_bytes, 8);

    let mut router = TestRouter::new();
    Endpoint::<Void, ById, Found>::builder()
        .with_defaults()
        .with(JsonWriter)
        .build()
        .expect("valid endpoint")
        .handle(router.mount(), "/x/{id}", find);
    let res = router.call(request(Method::GET, "/x/abc", &[], Vec::new()));
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let limited = Endpoint::<Value, Void, Value>::builder()
        .with_defaults()
        .with(JsonWriter)
        .build()
        .expect("valid endpoint")
        .into_handler(echo);
    let res = limited(request(Method::POST, "/echo", &[], r#"{"a":"long enough"}"#));
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    // Builder settings override the environment.
    let mut router = TestRouter::new();
    Endpoint::<Void, ById, Found>::builder()
        .with_defaults()
        .with(JsonWriter)
        .bind_policy(BindPolicy::Lenient)
        .build()
        .expect("valid endpoint")
        .handle(router.mount(), "/x/{id}", find);
    let res = router.call(request(Method::GET, "/x/abc", &[], Vec::new()));
    assert_eq!(res.status(), StatusCode::OK);

    let unlimited = Endpoint::<Value, Void, Value>::builder()
        .with_defaults()
        .with(JsonWriter)
        .max_body_bytes(0)
        .build()
        .expect("valid endpoint")
        .into_handler(echo);
    let res = unlimited(request(Method::POST, "/echo", &[], r#"{"a":"long enough"}"#));
    assert_eq!(res.status(), StatusCode::OK);

    std::env::remove_var("HANDLR_BIND_POLICY");
    std::env::remove_var("HANDLR_MAX_BODY_BYTES");
    assert_eq!(DispatchConfig::from_env(), DispatchConfig::default());
}

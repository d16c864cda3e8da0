//! End-to-end tests for the built-in codecs
//!
//! Each test builds an endpoint with a specific reader/writer mix and drives a
//! request through it: form and YAML bodies, HTML through templates, and one
//! endpoint serving several formats chosen per request.

mod common;

use common::test_router::{body_str, request, TestRouter};
use handlr::{
    Endpoint, FormBodyReader, JsonBodyReader, JsonWriter, RequestContext, TemplateWriter, Void,
    YamlBodyReader, YamlWriter,
};
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize, handlr::Payload)]
struct Signup {
    name: String,
    email: String,
}

#[derive(Debug, Serialize, handlr::Payload)]
struct Welcome {
    name: String,
    email: String,
}

fn signup(_ctx: &RequestContext, body: Signup, _params: Void) -> anyhow::Result<Welcome> {
    Ok(Welcome {
        name: body.name,
        email: body.email,
    })
}

fn multi_format_router() -> TestRouter {
    let mut env = Environment::new();
    env.add_template("welcome.html", "<p>Welcome {{ name }} &lt;{{ email }}&gt;</p>")
        .expect("template parses");

    let mut router = TestRouter::new();
    Endpoint::<Signup, Void, Welcome>::builder()
        .with(JsonBodyReader)
        .with(FormBodyReader)
        .with(YamlBodyReader)
        .with(JsonWriter)
        .with(YamlWriter)
        .with(TemplateWriter::new(Arc::new(env), "welcome.html"))
        .build()
        .expect("valid endpoint")
        .handle(router.mount(), "/signup", signup);
    router
}

#[test]
fn test_form_body_to_json() {
    let router = multi_format_router();
    let res = router.call(request(
        Method::POST,
        "/signup",
        &[("content-type", "application/x-www-form-urlencoded")],
        "name=Ada+Lovelace&email=ada%40example.com",
    ));
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body_str(&res),
        r#"{"name":"Ada Lovelace","email":"ada@example.com"}"#
    );
}

#[test]
fn test_yaml_body_to_yaml() {
    let router = multi_format_router();
    let res = router.call(request(
        Method::POST,
        "/signup",
        &[
            ("content-type", "application/yaml"),
            ("accept", "application/yaml"),
        ],
        "name: Grace\nemail: grace@example.com\n",
    ));
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "application/yaml");
    assert_eq!(body_str(&res), "name: Grace\nemail: grace@example.com\n");
}

#[test]
fn test_html_through_template() {
    let router = multi_format_router();
    let res = router.call(request(
        Method::POST,
        "/signup",
        &[("accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")],
        r#"{"name":"Linus","email":"linus@example.com"}"#,
    ));
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
    assert_eq!(
        body_str(&res),
        "<p>Welcome Linus &lt;linus@example.com&gt;</p>"
    );
}

#[test]
fn test_browser_accept_falls_back_to_json_wildcard() {
    let router = multi_format_router();
    let res = router.call(request(
        Method::POST,
        "/signup",
        &[("accept", "application/xhtml+xml, */*;q=0.1")],
        r#"{"name":"Ken","email":"ken@example.com"}"#,
    ));
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
}

#[test]
fn test_missing_template_is_server_error() {
    let env = Environment::new();
    let handler = Endpoint::<Signup, Void, Welcome>::builder()
        .with(JsonBodyReader)
        .with(TemplateWriter::new(Arc::new(env), "absent.html"))
        .build()
        .expect("valid endpoint")
        .into_handler(signup);

    let res = handler(request(
        Method::POST,
        "/signup",
        &[("accept", "text/html")],
        r#"{"name":"A","email":"a@example.com"}"#,
    ));
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_str(&res).starts_with("error rendering template"));
}

#[test]
fn test_form_missing_field_is_bad_request() {
    let router = multi_format_router();
    let res = router.call(request(
        Method::POST,
        "/signup",
        &[("content-type", "application/x-www-form-urlencoded")],
        "name=Ada",
    ));
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

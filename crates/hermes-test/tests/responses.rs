//! Result shaping: default codes, directives, redirects, templates and
//! error bodies.

use bytes::Bytes;
use http::StatusCode;
use serde_json::{json, Map};

use hermes_core::{HttpError, Json};
use hermes_executor::Executor;
use hermes_metadata::{MetadataArgsStorage, Param, TransformOptions};
use hermes_middleware::DriverOptions;
use hermes_test::{MemoryDriver, TestClient};

#[derive(Default)]
struct Outcomes;

#[derive(Default)]
struct Pages;

fn outcomes(storage: &mut MetadataArgsStorage) {
    storage
        .controller::<Outcomes>("/outcomes")
        .get("/undefined", "undefined", |_ctl, _args| async { Ok::<_, HttpError>(()) })
        .end()
        .get("/null", "null", |_ctl, _args| async { Ok::<_, HttpError>(None::<String>) })
        .end()
        .get("/empty", "empty", |_ctl, _args| async { Ok::<_, HttpError>("") })
        .end()
        .get("/text", "text", |_ctl, _args| async { Ok::<_, HttpError>("plain words") })
        .end()
        .get("/object", "object", |_ctl, _args| async {
            Ok::<_, HttpError>(Json(json!({ "kind": "object" })))
        })
        .end()
        .get("/bytes", "bytes", |_ctl, _args| async {
            Ok::<_, HttpError>(Bytes::from_static(b"\x00\x01"))
        })
        .end()
        .get("/json", "json", |_ctl, _args| async { Ok::<_, HttpError>("quoted") })
        .json_response()
        .end()
        .get("/quiet", "quiet", |_ctl, _args| async { Ok::<_, HttpError>(()) })
        .on_undefined(StatusCode::NO_CONTENT)
        .end()
        .get("/nothing", "nothing", |_ctl, _args| async { Ok::<_, HttpError>(None::<String>) })
        .on_null(StatusCode::GONE)
        .end()
        .get("/blank", "blank", |_ctl, _args| async { Ok::<_, HttpError>("") })
        .on_empty(StatusCode::ACCEPTED)
        .end()
        .get("/csv", "csv", |_ctl, _args| async { Ok::<_, HttpError>("a,b\n1,2") })
        .content_type("text/csv")
        .header("x-export", "questions")
        .header("cache-control", "no-store")
        .end()
        .post("/created", "created", |_ctl, _args| async {
            Ok::<_, HttpError>(Json(json!({ "ok": true })))
        })
        .http_code(StatusCode::CREATED)
        .location("/outcomes/1")
        .end()
        .get("/handled", "handled", |_ctl, args| async move {
            if let Some(response) = args.response(0) {
                response.set_status(StatusCode::ACCEPTED);
                response.set_header("x-handled", "yes");
            }
            Ok::<_, HttpError>("queued")
        })
        .param(Param::response())
        .end()
        .get("/forbidden", "forbidden", |_ctl, _args| async {
            Err::<(), _>(HttpError::forbidden("no access"))
        })
        .end();
}

fn client() -> TestClient {
    let mut storage = MetadataArgsStorage::new();
    outcomes(&mut storage);
    TestClient::from_storage(&storage).unwrap()
}

#[tokio::test]
async fn test_default_result_codes() {
    let client = client();
    client
        .get("/outcomes/undefined")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_empty_body();
    client
        .get("/outcomes/null")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_empty_body();
    client
        .get("/outcomes/empty")
        .send()
        .await
        .assert_status(StatusCode::NO_CONTENT)
        .assert_empty_body();
}

#[tokio::test]
async fn test_text_controller_bodies() {
    let client = client();
    client
        .get("/outcomes/text")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "text/plain; charset=utf-8")
        .assert_body_eq("plain words");
    client
        .get("/outcomes/object")
        .send()
        .await
        .assert_content_type("text/plain")
        .assert_body_eq(r#"{"kind":"object"}"#);
    let bytes = client.get("/outcomes/bytes").send().await;
    bytes.assert_content_type("application/octet-stream");
    assert_eq!(bytes.body().as_ref(), b"\x00\x01");
}

#[tokio::test]
async fn test_json_response_directive_forces_json() {
    client()
        .get("/outcomes/json")
        .send()
        .await
        .assert_content_type("application/json")
        .assert_body_eq(r#""quoted""#);
}

#[tokio::test]
async fn test_declared_result_codes() {
    let client = client();
    client
        .get("/outcomes/quiet")
        .send()
        .await
        .assert_status(StatusCode::NO_CONTENT);
    client
        .get("/outcomes/nothing")
        .send()
        .await
        .assert_status(StatusCode::GONE);
    client
        .get("/outcomes/blank")
        .send()
        .await
        .assert_status(StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_header_directives() {
    let client = client();
    client
        .get("/outcomes/csv")
        .send()
        .await
        .assert_header("content-type", "text/csv")
        .assert_header("x-export", "questions")
        .assert_header("cache-control", "no-store")
        .assert_body_eq("a,b\n1,2");
    client
        .post("/outcomes/created")
        .send()
        .await
        .assert_status(StatusCode::CREATED)
        .assert_header("location", "/outcomes/1");
}

#[tokio::test]
async fn test_response_param_overrides_status() {
    client()
        .get("/outcomes/handled")
        .send()
        .await
        .assert_status(StatusCode::ACCEPTED)
        .assert_header("x-handled", "yes")
        .assert_body_eq("queued");
}

#[tokio::test]
async fn test_text_controller_errors_are_plain() {
    client()
        .get("/outcomes/forbidden")
        .send()
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_content_type("text/plain")
        .assert_body_eq("no access");
}

fn pages(storage: &mut MetadataArgsStorage) {
    storage
        .json_controller::<Pages>("/pages")
        .get("/go/:id", "go", |_ctl, args| async move {
            let id: i64 = args.get(0)?;
            Ok::<_, HttpError>(Json(json!({ "id": id, "slug": "intro" })))
        })
        .param(Param::path("id"))
        .redirect("/pages/:id/:slug")
        .end()
        .get("/away", "away", |_ctl, _args| async {
            Ok::<_, HttpError>("https://example.com/elsewhere")
        })
        .redirect("/pages/home")
        .end()
        .get("/home", "home", |_ctl, _args| async {
            Ok::<_, HttpError>(Json(json!({ "title": "Welcome", "items": ["a", "b"] })))
        })
        .render("home.html")
        .end()
        .get("/blank", "blank", |_ctl, _args| async { Ok::<_, HttpError>(()) })
        .render("blank.html")
        .end()
        .get("/missing", "missing", |_ctl, _args| async { Ok::<_, HttpError>(()) })
        .render("missing.html")
        .end()
        .get("/profile", "profile", |_ctl, _args| async {
            Ok::<_, HttpError>(Json(json!({
                "name": "Ada",
                "password": "secret",
                "_internal": 1,
                "friends": [{ "name": "Bob", "password": "hunter2" }],
            })))
        })
        .transform(TransformOptions {
            excludes: vec!["password".to_string()],
            exclude_prefixes: vec!["_".to_string()],
        })
        .end()
        .get("/gone", "gone", |_ctl, _args| async {
            Err::<(), _>(HttpError::not_found("page is gone"))
        })
        .end();
}

fn pages_client(options: DriverOptions) -> TestClient {
    let mut storage = MetadataArgsStorage::new();
    pages(&mut storage);
    let driver = MemoryDriver::new()
        .with_template(
            "home.html",
            "<h1>{{ title }}</h1>{% for item in items %}<li>{{ item }}</li>{% endfor %}",
        )
        .unwrap()
        .with_template("blank.html", "<p>{{ title | default('untitled') }}</p>")
        .unwrap();
    let executor = Executor::new(&storage).with_options(options);
    TestClient::from_executor(&executor, driver).unwrap()
}

#[tokio::test]
async fn test_redirect_fills_params_from_result() {
    let client = pages_client(DriverOptions::default());
    let response = client.get("/pages/go/7").send().await;
    response
        .assert_status(StatusCode::FOUND)
        .assert_header("location", "/pages/7/intro")
        .assert_empty_body();
}

#[tokio::test]
async fn test_redirect_to_returned_location() {
    let client = pages_client(DriverOptions::default());
    client
        .get("/pages/away")
        .send()
        .await
        .assert_status(StatusCode::FOUND)
        .assert_header("location", "https://example.com/elsewhere");
}

#[tokio::test]
async fn test_rendered_template() {
    let client = pages_client(DriverOptions::default());
    client
        .get("/pages/home")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_content_type("text/html")
        .assert_body_eq("<h1>Welcome</h1><li>a</li><li>b</li>");
    client
        .get("/pages/blank")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_body_eq("<p>untitled</p>");
}

#[tokio::test]
async fn test_missing_template_is_server_error() {
    let client = pages_client(DriverOptions::default());
    client
        .get("/pages/missing")
        .send()
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_json_contains(&json!({ "name": "InternalServerError" }));
}

#[tokio::test]
async fn test_transform_options() {
    let client = pages_client(DriverOptions::default());
    client
        .get("/pages/profile")
        .send()
        .await
        .assert_json(&json!({ "name": "Ada", "friends": [{ "name": "Bob" }] }));

    let raw = pages_client(DriverOptions {
        use_class_transformer: false,
        ..DriverOptions::default()
    });
    let body = raw.get("/pages/profile").send().await.json_value().unwrap();
    assert_eq!(body["password"], "secret");
    assert_eq!(body["_internal"], 1);
}

#[tokio::test]
async fn test_error_overriding_map() {
    let mut overrides = Map::new();
    overrides.insert(
        "NotFoundError".to_string(),
        json!({ "message": "Nothing here", "hint": "check the address" }),
    );
    let client = pages_client(DriverOptions {
        error_overriding_map: overrides,
        ..DriverOptions::default()
    });

    client
        .get("/pages/gone")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_json(&json!({
            "name": "NotFoundError",
            "message": "Nothing here",
            "status": 404,
            "hint": "check the address",
        }));
}

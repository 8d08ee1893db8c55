#![allow(dead_code)]

use std::path::Path;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use assetline_api::config::ServerConfig;
use assetline_api::router::build_app_router;
use assetline_api::state::AppState;
use assetline_core::manifest::Manifest;

/// Registration manifest used by every API test.
///
/// Admin pages get `lib` + `app` scripts and `admin` (priority 10) + `base`
/// (priority 50) styles. `tools.php` adds a missing reported source,
/// `plugins.php` a missing silent one. Frontend `single` pages get `front`.
pub const TEST_MANIFEST: &str = r##"{
    "directives": [
        { "action": "register", "type": "script", "name": "lib", "options": "js/lib.js" },
        { "action": "load", "type": "script", "name": "app",
          "options": { "src": "js/app.js", "deps": ["lib", "jquery-ui"], "priority": 50 } },
        { "action": "load", "type": "style", "name": "base",
          "options": { "src": "css/base.css", "priority": 50 } },
        { "action": "load", "type": "style", "name": "admin",
          "options": { "src": "css/admin.css", "deps": ["zzz"], "priority": 10 } },
        { "action": "load", "type": "style", "name": "loud",
          "options": { "src": "css/gone.css", "page": "tools.php" } },
        { "action": "load", "type": "style", "name": "quiet",
          "options": { "src": "css/nope.css", "page": "plugins.php", "report": false } },
        { "action": "load", "type": "script", "name": "front",
          "options": { "src": "js/front.js", "admin": false, "page": "single" } },
        { "action": "localize", "name": "theme", "data": { "color": "#336699" } }
    ]
}"##;

fn write_fixture(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Populate `root` with the sources referenced by [`TEST_MANIFEST`].
pub fn write_fixtures(root: &Path) {
    write_fixture(root, "js/lib.js", b"var lib = 1");
    write_fixture(root, "js/app.js", b"lib += 1");
    write_fixture(root, "js/front.js", b"var front = true");
    write_fixture(root, "css/base.css", b".base { margin: 0 }");
    write_fixture(
        root,
        "css/admin.css",
        b".admin { color: [[theme.color]]; background: url(img/bg.png); }",
    );
    write_fixture(root, "css/img/bg.png", b"\x89PNG fake");
}

/// Build a test `ServerConfig` pointing at `assets_dir`.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and disables remote sources.
pub fn test_config(assets_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        assets_dir: assets_dir.to_string_lossy().into_owned(),
        remote_sources: false,
        ..Default::default()
    }
}

/// A router over a temporary assets directory. The directory lives as long
/// as this value.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub dir: TempDir,
}

/// Build the full application router with all middleware layers over the
/// test fixtures.
pub fn build_test_app() -> TestApp {
    build_test_app_with(|_| {})
}

/// Like [`build_test_app`], with a hook to adjust the configuration.
pub fn build_test_app_with(configure: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let mut config = test_config(dir.path());
    configure(&mut config);

    let manifest = Manifest::from_json_str(TEST_MANIFEST).unwrap();
    let state = AppState::new(config, manifest);
    let router = build_app_router(state.clone());
    TestApp { router, state, dir }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> Response {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// POST a page context to the render endpoint, optionally presenting a
    /// session cookie (`name=value`).
    pub async fn render(&self, page: Value, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/pages/render")
            .header(CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(page.to_string())).unwrap())
            .await
    }

    /// Render `page` in a fresh session and return the session cookie.
    pub async fn render_new_session(&self, page: Value) -> String {
        let response = self.render(page, None).await;
        assert!(response.status().is_success());
        session_cookie(&response)
    }
}

/// `name=value` part of the session `Set-Cookie` header.
pub fn session_cookie(response: &Response) -> String {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .unwrap();
    header.split(';').next().unwrap().to_string()
}

pub fn admin_page(identifier: &str) -> Value {
    json!({ "is_admin_area": true, "page_identifier": identifier })
}

pub fn frontend_page(flags: &[&str]) -> Value {
    json!({ "is_admin_area": false, "page_identifier": "", "page_kind_flags": flags })
}

pub fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

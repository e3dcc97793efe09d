#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{multipart, StatusCode};

use sogrub::config::AppConfig;
use sogrub::testing::{MemoryImageStore, MemoryProductStore, StaticAuthProvider, TestApp};

pub use sogrub::testing::{ADMIN_EMAIL, ADMIN_PASSWORD};

/// Router served on a free local port, backed by in-memory platform fakes
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub products: Arc<MemoryProductStore>,
    pub images: Arc<MemoryImageStore>,
    pub auth: Arc<StaticAuthProvider>,
    admin_token: String,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_app(TestApp::new()).await
}

pub async fn spawn_server_with_config(config: AppConfig) -> Result<TestServer> {
    spawn_app(TestApp::with_config(config)).await
}

pub async fn spawn_app(test_app: TestApp) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;

    let admin_token = test_app.admin_token();
    let router = sogrub::app(test_app.state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum_serve(listener, router).await {
            eprintln!("test server stopped: {}", e);
        }
    });

    let server = TestServer {
        port,
        base_url,
        products: test_app.products,
        images: test_app.images,
        auth: test_app.auth,
        admin_token,
    };
    wait_ready(&server, Duration::from_secs(5)).await?;
    Ok(server)
}

async fn axum_serve(listener: tokio::net::TcpListener, router: axum::Router) -> std::io::Result<()> {
    axum::serve(listener, router).await
}

async fn wait_ready(server: &TestServer, timeout: Duration) -> Result<()> {
    let client = reqwest::Client::new();
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if let Ok(resp) = client.get(server.url("/health")).send().await {
            if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    anyhow::bail!("server did not become ready on {} within {:?}", server.base_url, timeout)
}

/// Text parts for a product form
pub fn product_form(fields: &[(&str, &str)]) -> multipart::Form {
    fields
        .iter()
        .fold(multipart::Form::new(), |form, (name, value)| {
            form.text(name.to_string(), value.to_string())
        })
}

/// Form with an `image` file part attached
pub fn with_image(form: multipart::Form, file_name: &str, mime: &str, bytes: Vec<u8>) -> Result<multipart::Form> {
    let part = multipart::Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime)?;
    Ok(form.part("image", part))
}

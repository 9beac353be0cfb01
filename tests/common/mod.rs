use multiindex::IndexRegistry;
use multiindex_http::auth::StaticCredential;
use multiindex_http::handlers::AppState;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const USER: &str = "crawler";
pub const PASSWORD: &str = "s3cret";

pub struct TestServer {
    pub addr: String,
    pub registry: Arc<IndexRegistry>,
    pub client: reqwest::Client,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).basic_auth(USER, Some(PASSWORD))
    }

    pub fn post_json(&self, path: &str, body: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .basic_auth(USER, Some(PASSWORD))
            .header("content-type", "application/json")
            .body(body.to_string())
    }
}

pub async fn spawn_server() -> TestServer {
    let temp_dir = TempDir::new().unwrap();
    let registry = IndexRegistry::open(temp_dir.path().join("data")).unwrap();
    let state = Arc::new(AppState::new(Arc::clone(&registry)));
    let app = multiindex_http::build_router(
        state,
        Arc::new(StaticCredential::new(USER, PASSWORD)),
        1024 * 1024,
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Poll the favicon route instead of a blind sleep.
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if client
            .get(format!("http://{}/favicon.ico", addr))
            .basic_auth(USER, Some(PASSWORD))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    TestServer {
        addr,
        registry,
        client,
        _temp_dir: temp_dir,
    }
}

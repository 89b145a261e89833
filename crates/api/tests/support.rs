#![allow(dead_code)]

use opsdeck_app::AppContext;
use opsdeck_domain::{ClientConfig, Config, DatabaseConfig, NewInstance, ResourceKind};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build an [`AppContext`] backed by a fresh database in a temporary
/// directory. The directory must outlive the context.
pub async fn create_test_context() -> opsdeck_domain::Result<(AppContext, TempDir)> {
    let temp_dir = TempDir::new().expect("failed to create temporary test directory");
    let db_path = temp_dir.path().join("data").join("opsdeck.db");

    let config = Config {
        database: DatabaseConfig { path: db_path.to_string_lossy().to_string(), pool_size: 4 },
        clients: ClientConfig {
            connect_timeout_secs: 1,
            probe_timeout_secs: 2,
            warmup_concurrency: 4,
            ..ClientConfig::default()
        },
        ..Config::default()
    };

    let ctx = AppContext::new_with_config(config).await?;
    Ok((ctx, temp_dir))
}

/// Mock search cluster answering the liveness probe and root endpoint.
pub async fn healthy_cluster(cluster_name: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "node-1",
            "cluster_name": cluster_name,
            "cluster_uuid": "uuid-1",
            "version": { "number": "8.13.0" },
            "tagline": "You Know, for Search"
        })))
        .mount(&server)
        .await;
    server
}

/// Register a search instance pointing at `address`.
pub async fn register(ctx: &AppContext, name: &str, address: Option<String>) -> u64 {
    let mut instance = NewInstance::new(name, ResourceKind::Elasticsearch);
    if let Some(address) = address {
        instance = instance.with_address(address);
    }
    ctx.instances.insert(instance).await.expect("instance should be registered").id
}

/// Address of a local port with nothing listening on it.
pub fn closed_port_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("127.0.0.1:{port}")
}

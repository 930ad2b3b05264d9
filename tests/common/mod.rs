//! Shared utilities for integration testing.

use std::fs;
use std::net::SocketAddr;
use tempfile::TempDir;
use tokio::net::TcpListener;

use ocs_client::OcsClient;
use ocs_gateway::config::{AccountConfig, GatewayConfig};
use ocs_gateway::http::HttpServer;
use ocs_gateway::lifecycle::{build_services, Shutdown};

/// Bytes in alice's own files.
pub const ALICE_USED: u64 = 300;
pub const ALICE_QUOTA: u64 = 1000;

/// A gateway running on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub base_url: String,
    shutdown: Shutdown,
    _data_dir: TempDir,
}

impl TestGateway {
    pub fn anonymous(&self) -> OcsClient {
        OcsClient::new(&self.base_url)
    }

    /// A client authenticated as `user` with its fixture password.
    pub fn client(&self, user: &str) -> OcsClient {
        OcsClient::new(&self.base_url).with_credentials(user, &password(user))
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger("test finished");
    }
}

pub fn password(user: &str) -> String {
    format!("{user}-secret")
}

fn account(username: &str, groups: &[&str], quota_bytes: Option<u64>) -> AccountConfig {
    AccountConfig {
        username: username.to_string(),
        password: password(username),
        groups: groups.iter().map(|g| g.to_string()).collect(),
        quota_bytes,
    }
}

/// Start a gateway with accounts `admin` (admin group), `alice` and `bob`.
pub async fn spawn_gateway() -> TestGateway {
    spawn_gateway_with(|_| {}).await
}

/// Start a gateway after letting `customize` adjust the configuration.
pub async fn spawn_gateway_with(customize: impl FnOnce(&mut GatewayConfig)) -> TestGateway {
    let data_dir = tempfile::tempdir().unwrap();
    let files = data_dir.path().join("alice").join("files");
    fs::create_dir_all(files.join("Shared")).unwrap();
    fs::write(files.join("notes.txt"), vec![b'x'; ALICE_USED as usize]).unwrap();
    fs::write(files.join("Shared").join("big.bin"), vec![0u8; 500]).unwrap();

    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.ocs.xml_indent = 0;
    config.storage.data_dir = Some(data_dir.path().to_path_buf());
    config.accounts = vec![
        account("admin", &["admin"], None),
        account("alice", &[], Some(ALICE_QUOTA)),
        account("bob", &[], None),
    ];
    customize(&mut config);
    let base_path = config.ocs.base_path.clone();

    let services = build_services(&config).unwrap();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, services.collaborators).unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestGateway {
        addr,
        base_url: format!("http://{addr}{base_path}"),
        shutdown,
        _data_dir: data_dir,
    }
}

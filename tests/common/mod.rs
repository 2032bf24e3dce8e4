//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use ngx_config_agent::config::AgentConfig;
use ngx_config_agent::http::AgentServer;
use ngx_config_agent::lifecycle::Shutdown;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// An agent serving on an ephemeral port over a temporary config directory.
pub struct TestAgent {
    pub addr: SocketAddr,
    pub dir: TempDir,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

/// Start an agent whose reload command is `/bin/sh -c <reload_script>`.
pub async fn start_agent(reload_script: &str) -> TestAgent {
    start_agent_with(reload_script, |_| {}).await
}

#[allow(dead_code)]
pub async fn start_agent_with<F>(reload_script: &str, tweak: F) -> TestAgent
where
    F: FnOnce(&mut AgentConfig),
{
    let dir = tempfile::tempdir().unwrap();

    let mut config = AgentConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.nginx.config_dir = dir.path().to_string_lossy().into_owned();
    config.nginx.binary_path = "/bin/sh".into();
    config.nginx.reload_args = vec!["-c".into(), reload_script.into()];
    config.nginx.reload_timeout_secs = 5;
    config.timeouts.request_secs = 30;
    config.logging.log_dir = String::new();
    tweak(&mut config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = AgentServer::new(config);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap();

    TestAgent {
        addr,
        dir,
        client,
        shutdown,
    }
}

#[allow(dead_code)]
impl TestAgent {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, content: &str) {
        std::fs::write(self.dir.path().join(name), content).unwrap();
    }

    pub fn read(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.dir.path().join(name)).ok()
    }

    /// Sorted names of every entry in the config directory.
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

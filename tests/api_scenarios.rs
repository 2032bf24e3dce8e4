//! End-to-end behaviour of the `/api/ngx` surface.
#![cfg(unix)]

use reqwest::StatusCode;
use serde_json::Value;

mod common;

async fn list(agent: &common::TestAgent) -> Vec<(String, String)> {
    let res = agent.client.get(agent.url("/api/ngx/configs")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Vec<Value> = res.json().await.unwrap();
    body.into_iter()
        .map(|f| {
            (
                f["filename"].as_str().unwrap().to_string(),
                f["content"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_put_commits_when_reload_succeeds() {
    let agent = common::start_agent("exit 0").await;
    agent.write("app.conf", "old");

    let res = agent
        .client
        .put(agent.url("/api/ngx/configs/app.conf"))
        .form(&[("content", "server{}")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Config updated successfully");

    assert_eq!(list(&agent).await, vec![("app.conf".to_string(), "server{}".to_string())]);
}

#[tokio::test]
async fn test_put_rolls_back_when_reload_fails() {
    let agent = common::start_agent("echo 'nginx: [emerg] bad' >&2; exit 1").await;
    agent.write("app.conf", "old");

    let res = agent
        .client
        .put(agent.url("/api/ngx/configs/app.conf"))
        .form(&[("content", "server{}")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.text().await.unwrap().contains("[emerg] bad"));

    assert_eq!(list(&agent).await, vec![("app.conf".to_string(), "old".to_string())]);
}

#[tokio::test]
async fn test_delete_missing_file_is_404() {
    let agent = common::start_agent("exit 0").await;
    agent.write("keep.conf", "server{}");

    let res = agent
        .client
        .delete(agent.url("/api/ngx/configs/missing.conf"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(agent.entries(), vec!["keep.conf".to_string()]);
}

#[tokio::test]
async fn test_post_creates_new_file() {
    let agent = common::start_agent("exit 0").await;

    let res = agent
        .client
        .post(agent.url("/api/ngx/configs/new.conf"))
        .form(&[("content", "x")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Config uploaded successfully");

    assert_eq!(list(&agent).await, vec![("new.conf".to_string(), "x".to_string())]);
}

#[tokio::test]
async fn test_post_removes_created_file_when_reload_fails() {
    let agent = common::start_agent("exit 1").await;

    let res = agent
        .client
        .post(agent.url("/api/ngx/configs/new.conf"))
        .form(&[("content", "x")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(agent.entries().is_empty());
}

#[tokio::test]
async fn test_delete_commits_and_rolls_back() {
    let agent = common::start_agent("exit 0").await;
    agent.write("app.conf", "server{}");

    let res = agent
        .client
        .delete(agent.url("/api/ngx/configs/app.conf"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Config deleted successfully");
    assert_eq!(agent.read("app.conf"), None);

    let failing = common::start_agent("exit 1").await;
    failing.write("app.conf", "server{}");
    let res = failing
        .client
        .delete(failing.url("/api/ngx/configs/app.conf"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(failing.read("app.conf").as_deref(), Some("server{}"));
}

#[tokio::test]
async fn test_update_missing_file_is_404() {
    let agent = common::start_agent("exit 0").await;

    let res = agent
        .client
        .put(agent.url("/api/ngx/configs/missing.conf"))
        .form(&[("content", "x")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "File not found");
    assert!(agent.entries().is_empty());
}

#[tokio::test]
async fn test_missing_or_empty_content_is_400() {
    let agent = common::start_agent("exit 0").await;
    agent.write("app.conf", "old");

    let no_field = agent
        .client
        .put(agent.url("/api/ngx/configs/app.conf"))
        .form(&[("other", "x")])
        .send()
        .await
        .unwrap();
    assert_eq!(no_field.status(), StatusCode::BAD_REQUEST);
    assert_eq!(no_field.text().await.unwrap(), "Missing content in request");

    let empty = agent
        .client
        .post(agent.url("/api/ngx/configs/app.conf"))
        .form(&[("content", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let no_body = agent
        .client
        .put(agent.url("/api/ngx/configs/app.conf"))
        .send()
        .await
        .unwrap();
    assert_eq!(no_body.status(), StatusCode::BAD_REQUEST);

    assert_eq!(agent.read("app.conf").as_deref(), Some("old"));
}

#[tokio::test]
async fn test_missing_filename_is_400() {
    let agent = common::start_agent("exit 0").await;

    for method in [reqwest::Method::POST, reqwest::Method::PUT, reqwest::Method::DELETE] {
        let res = agent
            .client
            .request(method, agent.url("/api/ngx/configs/"))
            .form(&[("content", "x")])
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(res.text().await.unwrap(), "Missing filename in request");
    }
}

#[tokio::test]
async fn test_traversal_is_rejected() {
    let agent = common::start_agent("exit 0").await;
    let escape = agent.path().parent().unwrap().join("escape.conf");

    let res = agent
        .client
        .post(agent.url("/api/ngx/configs/..%2Fescape.conf"))
        .form(&[("content", "x")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = agent
        .client
        .delete(agent.url("/api/ngx/configs/%2Fetc%2Fhostname"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = agent
        .client
        .get(agent.url("/api/ngx/configs/..%2F..%2Fetc%2Fpasswd"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert!(!escape.exists());
    assert!(agent.entries().is_empty());
}

#[tokio::test]
async fn test_hung_reload_is_bounded_and_rolled_back() {
    let agent = common::start_agent_with("exec sleep 30", |config| {
        config.nginx.reload_timeout_secs = 1;
        config.timeouts.request_secs = 10;
    })
    .await;
    agent.write("app.conf", "old");

    let res = agent
        .client
        .put(agent.url("/api/ngx/configs/app.conf"))
        .form(&[("content", "new")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.text().await.unwrap().contains("timed out"));
    assert_eq!(agent.read("app.conf").as_deref(), Some("old"));
}

#[tokio::test]
async fn test_list_only_returns_config_extension() {
    let agent = common::start_agent("exit 0").await;
    agent.write("a.conf", "server{}");
    agent.write("notes.txt", "ignore");
    std::fs::create_dir(agent.path().join("sub.conf")).unwrap();

    assert_eq!(list(&agent).await, vec![("a.conf".to_string(), "server{}".to_string())]);
}

#[tokio::test]
async fn test_list_fails_when_directory_is_missing() {
    let agent = common::start_agent_with("exit 0", |config| {
        config.nginx.config_dir.push_str("/missing");
    })
    .await;

    let res = agent.client.get(agent.url("/api/ngx/configs")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_show_single_file() {
    let agent = common::start_agent("exit 0").await;
    agent.write("app.conf", "server{}");

    let res = agent.client.get(agent.url("/api/ngx/configs/app.conf")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "server{}");

    let res = agent.client.get(agent.url("/api/ngx/configs/nope.conf")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_and_health() {
    let agent = common::start_agent("exit 0").await;

    let res = agent.client.get(agent.url("/api/ngx/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let generated = res.headers().get("x-request-id").unwrap().to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&generated).is_ok());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["mutation_stage"], "idle");

    let res = agent
        .client
        .get(agent.url("/api/ngx/configs"))
        .header("x-request-id", "client-chosen")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), "client-chosen");
}

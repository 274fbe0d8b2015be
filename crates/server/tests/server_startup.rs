use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};
use tokio_test::assert_ok;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config with storage and scratch space under `dir`
fn minimal_config(port: u16, dir: &Path) -> String {
    format!(
        r#"
[auth]
method = "none"

[server]
host = "127.0.0.1"
port = {}

[storage]
backend = "fs"

[storage.fs]
root = "{}"

[transcode]
temp_dir = "{}"
"#,
        port,
        dir.join("storage").display(),
        dir.join("scratch").display()
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_hlsmith"))
        .env("HLSMITH_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Run the binary with a config file and expect it to exit unsuccessfully.
async fn assert_exits_with_error(config_path: &Path) {
    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_hlsmith"))
            .env("HLSMITH_CONFIG", config_path)
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let port = get_available_port();
    let config = write_config(&minimal_config(port, dir.path()));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = assert_ok!(
        client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
    );

    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_returns_sanitized() {
    let dir = TempDir::new().unwrap();
    let port = get_available_port();
    let config = write_config(&minimal_config(port, dir.path()));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["auth"]["method"], "none");
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["storage"]["backend"], "fs");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_status_and_missing_source() {
    let dir = TempDir::new().unwrap();
    let port = get_available_port();
    let config = write_config(&minimal_config(port, dir.path()));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let status: serde_json::Value = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/video/status?videoKey=uploads%2Fa.mp4",
            port
        ))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(status["progress"], 0);
    assert_eq!(status["isComplete"], false);

    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/video/process", port))
        .json(&serde_json::json!({ "videoKey": "uploads/a.mp4" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 500);

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["error"], "Processing failed");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    assert_exits_with_error(Path::new("/nonexistent/config.toml")).await;
}

#[tokio::test]
async fn test_missing_auth_section_exits_with_error() {
    let config = write_config(
        r#"
[server]
port = 8080
"#,
    );
    assert_exits_with_error(config.path()).await;
}

#[tokio::test]
async fn test_api_key_without_key_exits_with_error() {
    let config = write_config(
        r#"
[auth]
method = "api_key"
"#,
    );
    assert_exits_with_error(config.path()).await;
}

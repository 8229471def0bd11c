use super::*;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a fake client that logs its arguments and `ECF_RID`, then exits with `code`.
fn fake_client(dir: &Path, code: i32) -> (PathBuf, PathBuf) {
    let log = dir.join("calls.log");
    let script = dir.join("ecflow_client");
    let body = format!(
        "#!/bin/sh\necho \"$ECF_RID $*\" >> '{}'\necho 'client said no' >&2\nexit {}\n",
        log.display(),
        code
    );
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    (script, log)
}

#[test]
fn test_command_line() {
    let client = EcflowClient::new("ecflow_client");
    let line = client
        .command_line(&ClientRequest::Abort { run_id: 99 })
        .unwrap();
    assert_eq!(line, "ecflow_client --abort=99");
}

#[test]
fn test_command_line_quotes_program_path() {
    let client = EcflowClient::new("/opt/ec flow/ecflow_client");
    let line = client.command_line(&ClientRequest::Complete).unwrap();
    let argv = CommandInvoker::split(&line).unwrap();
    assert_eq!(argv, vec!["/opt/ec flow/ecflow_client", "--complete"]);
}

#[test]
fn test_from_config() {
    let config = ClientConfig {
        program: "my_client".to_string(),
        timeout_secs: 0,
        trap_signals: true,
    };
    let client = EcflowClient::from_config(&config);
    assert_eq!(client.program(), "my_client");
    assert!(client.invoker.timeout().is_none());
}

#[tokio::test]
async fn test_send_passes_identity_env() {
    let temp_dir = TempDir::new().unwrap();
    let (script, log) = fake_client(temp_dir.path(), 0);
    let identity = JobIdentity::new("t1", "p", "/s/f/t1", 3141, 1);

    let client = EcflowClient::new(script.to_str().unwrap()).with_identity(&identity);
    let output = client
        .send(&ClientRequest::Init {
            run_id: identity.run_id(),
        })
        .await
        .unwrap();
    assert!(output.success());

    let calls = std::fs::read_to_string(&log).unwrap();
    let rid = identity.run_id();
    assert_eq!(calls.trim(), format!("{} --init={}", rid, rid));
}

#[tokio::test]
async fn test_send_reports_rejection() {
    let temp_dir = TempDir::new().unwrap();
    let (script, _log) = fake_client(temp_dir.path(), 1);

    let client = EcflowClient::new(script.to_str().unwrap());
    let output = client.send(&ClientRequest::Complete).await.unwrap();
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr_lossy().contains("client said no"));
}

#[tokio::test]
async fn test_send_missing_program() {
    let client = EcflowClient::new("/nonexistent/ecflow_client");
    let err = client.send(&ClientRequest::Complete).await.unwrap_err();
    assert!(err.is_spawn());
}

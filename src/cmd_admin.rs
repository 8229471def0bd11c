//! `ecfjob admin`: server administration.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{debug, error, info};

use ecfjob_client::{ClientRequest, EcflowClient, SchedulerClient};
use ecfjob_config::ClientConfig;

use crate::cli::{AdminAction, AdminArgs};
use crate::Settings;

/// Handle the admin subcommand.
pub(crate) fn handle_admin(args: AdminArgs, settings: Settings) -> ExitCode {
    if let Err(e) = crate::init_tracing(&settings.config.logging, &settings.warnings) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.action {
        AdminAction::Status => {
            runtime.block_on(ping_server(&settings.config.client, &args.host, args.port))
        }
        AdminAction::Start => start_server(&args),
        AdminAction::Stop => stop_server(&args),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Ping a server through the scheduler client.
///
/// Returns whether it answered; a client that cannot be started is an error.
async fn ping_server(config: &ClientConfig, host: &str, port: u16) -> anyhow::Result<bool> {
    let client = EcflowClient::from_config(config);
    let request = ClientRequest::Ping {
        host: host.to_string(),
        port,
    };
    let output = client.send(&request).await?;

    if output.success() {
        println!("Server is up and running");
        info!("Server {}:{} answered ping", host, port);
        Ok(true)
    } else {
        println!("Server is not running");
        debug!(
            "Ping {}:{} failed (exit code {}): {}",
            host,
            port,
            output.exit_code,
            output.stderr_lossy().trim()
        );
        Ok(false)
    }
}

fn start_server(args: &AdminArgs) -> anyhow::Result<bool> {
    let home = args.home.clone().unwrap_or_else(default_server_home);
    anyhow::bail!(
        "Starting a server is not supported (host {}, port {}, home {})",
        args.host,
        args.port,
        home.display()
    )
}

fn stop_server(args: &AdminArgs) -> anyhow::Result<bool> {
    anyhow::bail!(
        "Stopping a server is not supported (host {}, port {})",
        args.host,
        args.port
    )
}

/// Default server home: `~/.ecflow_server`.
fn default_server_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ecflow_server")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn fake_client(dir: &TempDir, code: i32) -> ClientConfig {
        let program = dir.path().join("ecflow_client");
        std::fs::write(&program, format!("#!/bin/sh\nexit {}\n", code)).unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        ClientConfig {
            program: program.to_string_lossy().into_owned(),
            ..Default::default()
        }
    }

    fn admin_args(action: AdminAction) -> AdminArgs {
        AdminArgs {
            action,
            host: "localhost".to_string(),
            port: 3141,
            home: None,
        }
    }

    #[tokio::test]
    async fn test_ping_up() {
        let dir = TempDir::new().unwrap();
        let config = fake_client(&dir, 0);
        assert!(ping_server(&config, "localhost", 3141).await.unwrap());
    }

    #[tokio::test]
    async fn test_ping_down() {
        let dir = TempDir::new().unwrap();
        let config = fake_client(&dir, 1);
        assert!(!ping_server(&config, "localhost", 3141).await.unwrap());
    }

    #[tokio::test]
    async fn test_ping_missing_client() {
        let config = ClientConfig {
            program: "/nonexistent/ecflow_client".to_string(),
            ..Default::default()
        };
        assert!(ping_server(&config, "localhost", 3141).await.is_err());
    }

    #[test]
    fn test_start_and_stop_unsupported() {
        let err = start_server(&admin_args(AdminAction::Start)).unwrap_err();
        assert!(err.to_string().contains("not supported"));
        assert!(err.to_string().contains(".ecflow_server"));
        assert!(stop_server(&admin_args(AdminAction::Stop)).is_err());
    }
}

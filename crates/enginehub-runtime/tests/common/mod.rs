//! Stub engines for integration tests.
//!
//! An engine is faked with two pieces: an executable shell script that the
//! controller spawns, and an in-process axum server that answers
//! `GET /v1/models` on the engine's port.

#![allow(dead_code)]

use axum::routing::get;
use axum::{Json, Router};
use enginehub_runtime::ControllerConfig;
use enginehub_core::{EngineKind, EngineSettings};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Poll interval used by every stub-backed controller.
pub const POLL: Duration = Duration::from_millis(250);

/// A directory holding stub engine scripts and their spawn logs.
pub struct StubDir {
    dir: TempDir,
}

impl StubDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write an executable `sh` script called `name`.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        #[cfg(unix)]
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Script that records each launch (pid, `VLLM_TARGET_DEVICE`, args) in
    /// `<name>.log` and then stays alive.
    pub fn long_running(&self, name: &str) -> PathBuf {
        let log = self.log_path(name);
        self.script(
            name,
            &format!(
                "echo \"$$ ${{VLLM_TARGET_DEVICE:-}} $*\" >> '{}'\nexec sleep 30",
                log.display()
            ),
        )
    }

    pub fn log_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(format!("{name}.log"))
    }

    /// Launch records written by a [`long_running`](Self::long_running) stub.
    pub fn launches(&self, name: &str) -> Vec<String> {
        fs::read_to_string(self.log_path(name))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Pid of the most recent launch.
    pub fn last_pid(&self, name: &str) -> Option<i32> {
        self.launches(name)
            .last()
            .and_then(|l| l.split_whitespace().next())
            .and_then(|p| p.parse().ok())
    }
}

/// A port nothing listens on right now.
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Serve `GET /v1/models` on `port` once `delay` has passed.
///
/// Until then the port refuses connections, like an engine that is still
/// loading weights.
pub fn serve_models_after(port: u16, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        let router = Router::new().route(
            "/v1/models",
            get(|| async { Json(serde_json::json!({ "object": "list", "data": [] })) }),
        );
        axum::serve(listener, router).await.unwrap();
    });
}

/// Accept connections on `port` and never answer them, like an engine
/// wedged while loading.
pub fn accept_and_hold(port: u16) {
    tokio::spawn(async move {
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
}

/// Controller settings for a stub engine binary on `port`.
pub fn stub_config(kind: EngineKind, binary: &Path, port: u16) -> ControllerConfig {
    ControllerConfig {
        binary: binary.display().to_string(),
        port,
        startup_timeout: Duration::from_secs(10),
        poll_interval: POLL,
        health_timeout: Duration::from_secs(1),
        stop_grace: Duration::from_secs(2),
        ..ControllerConfig::from_settings(&EngineSettings::defaults_for(kind))
    }
}

/// True if a process with `pid` still exists.
#[cfg(unix)]
pub fn pid_alive(pid: i32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok()
}

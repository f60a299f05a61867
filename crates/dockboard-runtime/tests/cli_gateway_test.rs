//! Integration tests for the CLI gateway against a scripted `docker`.
//!
//! Each test writes a small shell script standing in for the `docker`
//! binary, so the full path (argument building, bounded execution, output
//! parsing, failure classification) runs without a real runtime.

#![cfg(unix)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use dockboard_common::error::DockboardError;
use dockboard_common::types::{ContainerId, ContainerPort, ContainerStatus};
use dockboard_runtime::gateway::RuntimeGateway;
use dockboard_runtime::gateway::cli::DockerCliGateway;

const FAKE_DOCKER: &str = r#"#!/bin/sh
case "$1" in
  ps)
    echo '{"ID":"4f66ad9a0b2e8c1d3f5a7b9c0d1e2f3a4b5c6d7e8f90a1b2c3d4e5f6a7b8c9d0","Names":"web","Image":"nginx:1.27","State":"running","Status":"Up 2 hours","Ports":"0.0.0.0:8080->80/tcp, :::8080->80/tcp","Labels":"app.description=Landing page"}'
    echo 'this line is not json'
    if [ "$5" = "--all" ]; then
      echo '{"ID":"9a9a9a9a9a9a9a9a","Names":"batch","Image":"busybox","State":"exited","Status":"Exited (0) 1 day ago","Ports":"","Labels":""}'
    fi
    ;;
  inspect)
    if [ "$6" != "--" ]; then
      echo "unknown flag: $6" >&2
      exit 125
    fi
    if [ "$7" = "ghost" ]; then
      echo "Error: No such object: ghost" >&2
      exit 1
    fi
    echo '{"Id":"4f66ad9a0b2e8c1d3f5a7b9c0d1e2f3a4b5c6d7e8f90a1b2c3d4e5f6a7b8c9d0","Name":"/web","Image":"sha256:abc","State":{"Status":"running","Running":true},"Config":{"Image":"nginx:1.27","Env":["A=1"]},"HostConfig":{"Binds":["/srv:/data"],"PortBindings":{"80/tcp":[{"HostIp":"","HostPort":"8080"}]}},"NetworkSettings":{"Ports":{"80/tcp":[{"HostIp":"0.0.0.0","HostPort":"8080"}]}}}'
    ;;
  image)
    echo '["nginx:1.27","nginx:stable"]'
    ;;
  start)
    echo "Error response from daemon: No such container: $3" >&2
    exit 1
    ;;
  stop|rm)
    if [ "$2" != "--" ]; then
      echo "unknown flag: $2" >&2
      exit 125
    fi
    echo "$3"
    ;;
  pull)
    sleep 5
    ;;
  *)
    echo "unexpected command $1" >&2
    exit 2
    ;;
esac
"#;

fn fake_docker(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("docker");
    std::fs::write(&path, FAKE_DOCKER).expect("write fake docker");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("make fake docker executable");
    path
}

fn gateway(dir: &tempfile::TempDir) -> DockerCliGateway {
    DockerCliGateway::with_binary(
        fake_docker(dir),
        Duration::from_secs(5),
        Duration::from_millis(300),
    )
}

#[test]
fn listing_skips_malformed_lines() {
    let dir = tempfile::tempdir().unwrap();
    let gw = gateway(&dir);

    let running = gw.list_containers(false).expect("listing succeeds");
    assert_eq!(running.len(), 1);
    let web = &running[0];
    assert_eq!(web.name, "web");
    assert_eq!(web.status, ContainerStatus::Running);
    assert_eq!(web.ports[&ContainerPort::tcp(80)].len(), 2);
    assert_eq!(web.label("app.description"), Some("Landing page"));

    let all = gw.list_containers(true).expect("listing succeeds");
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].status, ContainerStatus::Exited);
}

#[test]
fn inspect_captures_recreate_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let gw = gateway(&dir);

    let web = gw.get_container("web").expect("inspect succeeds");
    assert_eq!(web.id.short(), "4f66ad9a0b2e");
    assert_eq!(web.image_tags, vec!["nginx:1.27", "nginx:stable"]);
    assert_eq!(web.config.env, vec!["A=1"]);
    assert_eq!(web.config.binds, vec!["/srv:/data"]);
    assert!(web.config.port_bindings.contains_key(&ContainerPort::tcp(80)));
}

#[test]
fn unknown_container_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let gw = gateway(&dir);

    assert!(matches!(
        gw.get_container("ghost"),
        Err(DockboardError::NotFound { .. })
    ));
    assert!(matches!(
        gw.start(&ContainerId::new("ghost")),
        Err(DockboardError::NotFound { .. })
    ));
}

#[test]
fn successful_lifecycle_call_returns_unit() {
    let dir = tempfile::tempdir().unwrap();
    let gw = gateway(&dir);
    gw.stop(&ContainerId::new("web")).expect("stop succeeds");
}

#[test]
fn slow_pull_is_killed_at_the_pull_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let gw = gateway(&dir);

    let started = Instant::now();
    let err = gw.pull_image("nginx:1.27").expect_err("pull must time out");
    assert!(matches!(err, DockboardError::RuntimeUnavailable { .. }));
    assert!(err.to_string().contains("timed out"));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[test]
fn missing_binary_is_runtime_unavailable() {
    let gw = DockerCliGateway::with_binary(
        PathBuf::from("/nonexistent/docker"),
        Duration::from_secs(1),
        Duration::from_secs(1),
    );
    assert!(matches!(
        gw.list_containers(false),
        Err(DockboardError::RuntimeUnavailable { .. })
    ));
}

#[test]
fn ids_that_look_like_flags_stay_positional() {
    let dir = tempfile::tempdir().unwrap();
    let gw = gateway(&dir);
    gw.remove_container(&ContainerId::new("--force"))
        .expect("id is passed after the option terminator");
    gw.stop(&ContainerId::new("--help")).expect("stop succeeds");
}

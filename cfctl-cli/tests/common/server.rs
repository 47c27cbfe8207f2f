// See mod.rs for why this is needed.
#![allow(dead_code)]

use std::io::{BufRead, BufReader};
use std::net::TcpStream;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// A managed fixture gRPC server instance.
///
/// Spawns the `fixture-server` binary on an ephemeral port, parsed out of
/// its own startup line. The process is killed when this struct is dropped.
pub struct FixtureServer {
    process: Child,
    pub addr: String,
}

impl FixtureServer {
    /// Start a new fixture server on an OS-assigned port.
    ///
    /// Panics if the server fails to start or print its address within 10s.
    pub fn start() -> Self {
        let bin = fixture_server_bin();

        let mut process = Command::new(&bin)
            .args(["--port", "0"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .unwrap_or_else(|e| panic!("Failed to start fixture-server at {}: {e}", bin.display()));

        let stdout = process.stdout.take().expect("fixture-server has no stdout");
        let addr = read_listening_addr(stdout, Duration::from_secs(10));
        wait_for_port(&addr, Duration::from_secs(10));

        FixtureServer { process, addr }
    }

    pub fn endpoint(&self) -> String {
        format!("grpc://{}", self.addr)
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// Find the fixture-server binary path, derived from the cfctl binary's
/// own location since both are workspace members built to the same
/// target directory.
fn fixture_server_bin() -> std::path::PathBuf {
    let cfctl = std::path::PathBuf::from(env!("CARGO_BIN_EXE_cfctl"));
    let target_dir = cfctl.parent().expect("cfctl binary has no parent dir");
    target_dir.join("fixture-server")
}

/// Parse "Listening on <addr>" off the server's stdout.
fn read_listening_addr(stdout: std::process::ChildStdout, timeout: Duration) -> String {
    let start = Instant::now();
    let mut reader = BufReader::new(stdout);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => panic!("fixture-server exited before printing its address"),
            Ok(_) => {
                if let Some(addr) = line.trim().strip_prefix("Listening on ") {
                    return addr.to_string();
                }
            }
            Err(e) => panic!("failed to read fixture-server stdout: {e}"),
        }
        if start.elapsed() > timeout {
            panic!("timed out waiting for fixture-server to print its address");
        }
    }
}

fn wait_for_port(addr: &str, timeout: Duration) {
    let start = Instant::now();
    loop {
        if TcpStream::connect_timeout(
            &addr.parse().expect("fixture-server printed an invalid address"),
            Duration::from_millis(100),
        )
        .is_ok()
        {
            return;
        }
        if start.elapsed() > timeout {
            panic!("timed out waiting for fixture-server on {addr}");
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

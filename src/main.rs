//! Host-side helper: `cargo run` builds the WASM package into `static/pkg`
//! and serves the demo page from `static/` on port 8000.

use std::io;
use std::process::{Command, ExitCode, Stdio};

const PORT: &str = "8000";

fn build_pkg() -> io::Result<bool> {
    println!("Building WASM pkg …");
    let status = Command::new("wasm-pack")
        .args(["build", "--release", "--target", "web", "--out-dir", "static/pkg"])
        .status();
    match status {
        Ok(st) => Ok(st.success()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            eprintln!("wasm-pack not found in PATH. Serving whatever is already in static/pkg.");
            Ok(true)
        }
        Err(err) => Err(err),
    }
}

fn main() -> ExitCode {
    match build_pkg() {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("wasm-pack finished with errors. See https://rustwasm.github.io/wasm-pack/.");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            eprintln!("failed to run wasm-pack: {err}");
            return ExitCode::FAILURE;
        }
    }

    println!("Serving demo at http://127.0.0.1:{PORT} …");
    let server = Command::new("python3")
        .args(["-m", "http.server", PORT, "--directory", "static"])
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .status();
    match server {
        Ok(st) if st.success() => ExitCode::SUCCESS,
        Ok(st) => {
            eprintln!("http server exited with {st}");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("failed to start http server: {err}");
            ExitCode::FAILURE
        }
    }
}

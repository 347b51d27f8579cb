//! CyberShield Classifier - Command line entry point
//!
//! `cybershield-classify [request.json]` reads one inference request (file or
//! stdin), prints the JSON result. A rejected request prints
//! `{"error": code, "message": ...}` and exits with status 2.
//! `cybershield-classify --status` prints the engine status instead.

use std::io::Read;
use std::process::ExitCode;

use anyhow::Context;

use cybershield_core::api::status::engine_status;
use cybershield_core::constants::{APP_NAME, APP_VERSION};
use cybershield_core::{Engine, EngineConfig, InferRequest};

/// Exit status for a rejected request
const EXIT_REJECTED: u8 = 2;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let arg = std::env::args().nth(1);

    log::info!("Starting {} classifier v{}", APP_NAME, APP_VERSION);

    let config = EngineConfig::from_env();
    let engine = Engine::from_config(config);

    if arg.as_deref() == Some("--status") {
        println!("{}", serde_json::to_string_pretty(&engine_status(&engine))?);
        return Ok(ExitCode::SUCCESS);
    }

    let input = read_input(arg.as_deref())?;

    let outcome = InferRequest::from_json(&input).and_then(|request| engine.classify_request(request));

    match outcome {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            log::warn!("Request rejected: {}", e);
            let body = serde_json::json!({
                "error": e.code(),
                "message": e.to_string(),
            });
            println!("{}", body);
            Ok(ExitCode::from(EXIT_REJECTED))
        }
    }
}

fn read_input(path: Option<&str>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != "-" => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read request file {}", path))
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            Ok(buf)
        }
    }
}

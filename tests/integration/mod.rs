//! Integration tests for the execution engine.
//!
//! Each test runs real executions against a `wiremock` server, with profile
//! documents written to a temporary directory.

pub mod execution_loop_test;
pub mod post_process_test;
pub mod profile_test;
pub mod properties_test;

use http_cli::config::EngineConfig;
use http_cli::executor::ExecutionEngine;
use http_cli::session::MemorySessionStore;
use std::path::Path;
use std::sync::{Arc, Once};
use tempfile::TempDir;

static INIT: Once = Once::new();

/// Initialize test environment (run once)
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// A fresh engine reading profiles from `dir`, with its own session store.
pub fn engine_for(dir: &Path) -> ExecutionEngine {
    init_test_env();
    let config = EngineConfig {
        profiles_dir: Some(dir.to_path_buf()),
        ..EngineConfig::default()
    };
    ExecutionEngine::new(config, Arc::new(MemorySessionStore::new()))
}

/// Writes a profile document into `dir`.
pub fn write_profile(dir: &TempDir, file_name: &str, content: &str) {
    std::fs::write(dir.path().join(file_name), content).expect("Failed to write profile");
}

use std::path::PathBuf;

use wordtrack_session::config::SessionConfig;
use wordtrack_session::AppError;

fn sample_toml(work_dir: &str) -> String {
    format!(
        r#"
work_dir = '{work_dir}'
probe_timeout_ms = 250

[proxy]
port = 4001
max_wait_attempts = 5
command = {{ program = "node", args = ["proxy-server.js"] }}

[dev_server]
port = 4000
fallback_grace_ms = 2000

[rescue]
process_pattern = "LibreOffice"
staleness_seconds = 600
search_roots = ['{work_dir}']
destination = '{work_dir}/saved.docx'

[monitor]
interval_ms = 1000
"#
    )
}

#[test]
fn defaults_match_wordtrack_constants() {
    let config = SessionConfig::default();

    assert_eq!(config.proxy.port, 3001);
    assert_eq!(config.proxy.max_wait_attempts, 10);
    assert_eq!(config.proxy.command.display_line(), "npm run proxy");
    assert_eq!(config.dev_server.port, 3000);
    assert_eq!(config.dev_server.max_wait_attempts, 30);
    assert_eq!(config.dev_server.fallback_grace_ms, 5000);
    assert_eq!(config.dev_server.command.display_line(), "npm run dev-server");
    assert_eq!(config.rescue.file_pattern, "Word add-in*.docx");
    assert_eq!(config.rescue.staleness().as_secs(), 3600);
    assert_eq!(config.monitor.interval().as_secs(), 5);
    assert_eq!(config.probe_timeout().as_millis(), 500);
    assert_eq!(config.terminate_grace().as_secs(), 1);
}

#[test]
fn launcher_command_ends_with_manifest() {
    let config = SessionConfig::default();

    assert_eq!(
        config.launcher.full_command().display_line(),
        "npx office-addin-debugging start manifest.xml"
    );
}

#[test]
fn parses_partial_overrides() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().to_str().expect("utf8 path");

    let config = SessionConfig::from_toml_str(&sample_toml(root)).expect("config parses");

    assert_eq!(config.proxy.port, 4001);
    assert_eq!(config.proxy.host, "localhost", "unset fields keep defaults");
    assert_eq!(config.proxy.command.program, "node");
    assert_eq!(config.dev_server.port, 4000);
    assert_eq!(config.dev_server.max_wait_attempts, 30);
    assert_eq!(config.rescue.process_pattern, "LibreOffice");
    assert_eq!(config.rescue.search_roots, vec![PathBuf::from(root)]);
    assert_eq!(
        config.rescue.destination().expect("destination"),
        PathBuf::from(format!("{root}/saved.docx"))
    );
    assert_eq!(
        config.work_dir,
        temp.path().canonicalize().expect("canonical")
    );
}

#[test]
fn empty_document_is_valid() {
    let config = SessionConfig::from_toml_str("").expect("defaults validate");
    assert!(config.work_dir.is_absolute());
}

#[test]
fn rejects_zero_port() {
    let err = SessionConfig::from_toml_str("[proxy]\nport = 0\n").expect_err("zero port");
    assert!(matches!(err, AppError::Config(msg) if msg.contains("ports")));
}

#[test]
fn rejects_zero_wait_attempts() {
    let err = SessionConfig::from_toml_str("[dev_server]\nmax_wait_attempts = 0\n")
        .expect_err("zero attempts");
    assert!(matches!(err, AppError::Config(msg) if msg.contains("max_wait_attempts")));
}

#[test]
fn rejects_empty_program() {
    let err = SessionConfig::from_toml_str("[launcher]\ncommand = { program = \"\" }\n")
        .expect_err("empty program");
    assert!(matches!(err, AppError::Config(msg) if msg.contains("launcher")));
}

#[test]
fn rejects_invalid_glob() {
    let err = SessionConfig::from_toml_str("[rescue]\nfile_pattern = \"[\"\n")
        .expect_err("bad glob");
    assert!(matches!(err, AppError::Config(msg) if msg.contains("glob")));
}

#[test]
fn rejects_missing_work_dir() {
    let err = SessionConfig::from_toml_str("work_dir = '/nonexistent/wordtrack'\n")
        .expect_err("missing dir");
    assert!(matches!(err, AppError::Config(msg) if msg.contains("work_dir")));
}

#[test]
fn rejects_malformed_toml() {
    let err = SessionConfig::from_toml_str("[proxy\nport = 1").expect_err("bad toml");
    assert!(matches!(err, AppError::Config(msg) if msg.starts_with("invalid config")));
}

#[test]
fn load_from_missing_path_fails() {
    let err = SessionConfig::load_from_path("/nonexistent/wordtrack.toml").expect_err("no file");
    assert!(matches!(err, AppError::Config(msg) if msg.contains("failed to read config")));
}

//! The bulk-regenerate command from parsed arguments to rendered output.

use std::sync::Arc;

use certcascade::cli::{Cli, Command};
use certcascade::store::{MemoryStore, StoreError};
use certcascade::{bulk_regenerate, CancelHandle, CliConfig, CommandStatus, ConfigError, Report};
use clap::Parser;

fn config_from(args: &[&str]) -> Result<CliConfig, ConfigError> {
    let mut argv = vec!["certcascade", "bulk-regenerate", "--api", "https://store.test"];
    argv.extend_from_slice(args);
    let Command::BulkRegenerate(args) = Cli::try_parse_from(argv).unwrap().command;
    CliConfig::resolve(&args.supplied(), |_| None)
}

async fn run(store: Arc<MemoryStore>, config: &CliConfig) -> (CommandStatus, String) {
    let mut out = Vec::new();
    let status = bulk_regenerate(store, config, &CancelHandle::new(), &mut out)
        .await
        .unwrap();
    (status, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn text_report_and_exit_code() {
    let store = Arc::new(MemoryStore::new());
    store.add_signed("ca", "mid");
    store.add_signed("mid", "leaf");
    store.fail_regenerate("mid", StoreError::Network("reset".into()));

    let config = config_from(&["--signed-by", "ca"]).unwrap();
    let (status, out) = run(store, &config).await;

    assert_eq!(status.exit_code(), 1);
    assert_eq!(
        out,
        "ca: Succeeded\n\
         mid: Failed(NetworkError)\n\
         leaf: SkippedParentFailed\n\
         succeeded: 1, failed: 1, skipped: 1, cancelled: 0\n"
    );
}

#[tokio::test]
async fn json_report() {
    let store = Arc::new(MemoryStore::new());
    store.add_signed("ca", "leaf");

    let config = config_from(&["ca", "--output-json", "--workers", "2"]).unwrap();
    let (status, out) = run(store, &config).await;

    assert_eq!(status, CommandStatus::Success);
    let report: Report = serde_json::from_str(&out).unwrap();
    assert_eq!(report.root, "ca");
    assert_eq!(report.counts.succeeded, 2);
}

#[tokio::test]
async fn dry_run_reports_rejected_edges() {
    let store = Arc::new(MemoryStore::new());
    store.add_signed("ca", "a");
    store.add_signed("a", "ca");

    let config = config_from(&["ca", "--dry-run"]).unwrap();
    let (status, out) = run(Arc::clone(&store), &config).await;

    assert_eq!(status, CommandStatus::Failure);
    assert_eq!(
        out,
        "ca\n  a\n    ca (CycleDetected)\ndiscovered: 2, rejected: 1, unlisted: 0\n"
    );
    assert!(store.regenerate_calls().is_empty());
}

#[test]
fn usage_errors() {
    assert!(matches!(config_from(&[]), Err(ConfigError::Missing(_))));
    assert!(matches!(
        config_from(&["ca", "--retries", "11"]),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        config_from(&["ca", "--timeout", "10"]),
        Err(ConfigError::InvalidValue { flag: "--timeout", .. })
    ));
}

//! Command-line surface.
//!
//! Clap only parses; values are bound to [`CliConfig`](crate::config::CliConfig)
//! through the flag table so that each flag, its environment variable and its
//! effect are declared in one place.

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "certcascade")]
#[command(about = "Rotate a CA and every certificate it transitively signs", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Regenerate a CA, then everything it signs, in signing order
    BulkRegenerate(BulkRegenerateArgs),
}

#[derive(Debug, Args)]
pub struct BulkRegenerateArgs {
    /// Name of the CA to rotate
    #[arg(long = "signed-by", value_name = "NAME")]
    pub signed_by: Option<String>,

    /// Name of the CA to rotate (positional form of --signed-by)
    #[arg(value_name = "NAME", conflicts_with = "signed_by")]
    pub name: Option<String>,

    /// Store API endpoint [env: CERTCASCADE_API]
    #[arg(long, value_name = "URL")]
    pub api: Option<String>,

    /// Bearer token [env: CERTCASCADE_TOKEN]
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Per-request timeout, e.g. 500ms, 30s [env: CERTCASCADE_HTTP_TIMEOUT]
    #[arg(long, value_name = "DURATION")]
    pub http_timeout: Option<String>,

    /// Overall command timeout; remaining work is cancelled when it expires
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Maximum concurrent store calls per level (1-64, default 4) [env: CERTCASCADE_WORKERS]
    #[arg(long, value_name = "N")]
    pub workers: Option<String>,

    /// Maximum discovery depth below the CA (default 16)
    #[arg(long, value_name = "N")]
    pub max_depth: Option<String>,

    /// Maximum attempts for each listing call (1-10, default 3)
    #[arg(long, value_name = "N")]
    pub retries: Option<String>,

    /// Accept any server certificate [env: CERTCASCADE_SKIP_TLS_VALIDATION]
    #[arg(long)]
    pub skip_tls_validation: bool,

    /// Only discover and print what would be regenerated
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON
    #[arg(short = 'j', long)]
    pub output_json: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl BulkRegenerateArgs {
    /// Flags present on the command line, keyed by their long name.
    pub fn supplied(&self) -> Vec<(&'static str, String)> {
        let mut supplied = Vec::new();

        let root = self.signed_by.as_ref().or(self.name.as_ref());
        let values = [
            ("--signed-by", root),
            ("--api", self.api.as_ref()),
            ("--token", self.token.as_ref()),
            ("--http-timeout", self.http_timeout.as_ref()),
            ("--timeout", self.timeout.as_ref()),
            ("--workers", self.workers.as_ref()),
            ("--max-depth", self.max_depth.as_ref()),
            ("--retries", self.retries.as_ref()),
        ];
        for (flag, value) in values {
            if let Some(value) = value {
                supplied.push((flag, value.clone()));
            }
        }

        let switches = [
            ("--skip-tls-validation", self.skip_tls_validation),
            ("--dry-run", self.dry_run),
            ("--output-json", self.output_json),
            ("--verbose", self.verbose),
        ];
        for (flag, set) in switches {
            if set {
                supplied.push((flag, "true".to_string()));
            }
        }

        supplied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CliConfig, OutputFormat, FLAG_TABLE};

    fn parse(args: &[&str]) -> BulkRegenerateArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::BulkRegenerate(args) => args,
        }
    }

    #[test]
    fn test_every_supplied_flag_is_bound() {
        let args = parse(&[
            "certcascade",
            "bulk-regenerate",
            "--signed-by",
            "ca",
            "--api",
            "https://x",
            "--token",
            "t",
            "--http-timeout",
            "1s",
            "--timeout",
            "1m",
            "--workers",
            "2",
            "--max-depth",
            "3",
            "--retries",
            "4",
            "--skip-tls-validation",
            "--dry-run",
            "-j",
            "-v",
        ]);
        let supplied = args.supplied();
        assert_eq!(supplied.len(), FLAG_TABLE.len());
        for (flag, _) in &supplied {
            assert!(FLAG_TABLE.iter().any(|b| b.flag == *flag), "unbound flag {}", flag);
        }
    }

    #[test]
    fn test_positional_root() {
        let args = parse(&["certcascade", "bulk-regenerate", "my-ca", "--api", "https://x", "-j"]);
        let config = CliConfig::resolve(&args.supplied(), |_| None).unwrap();
        assert_eq!(config.root, "my-ca");
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn test_positional_conflicts_with_flag() {
        let result = Cli::try_parse_from([
            "certcascade",
            "bulk-regenerate",
            "a",
            "--signed-by",
            "b",
        ]);
        assert!(result.is_err());
    }
}

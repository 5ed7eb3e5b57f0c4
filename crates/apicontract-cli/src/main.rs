//! apicontract CLI - declarative HTTP contract testing against a live API

mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};

use apicontract_core::report::render_summary;
use apicontract_core::{
    Config, DryRunPlan, ReportFormat, Strictness, load_fixtures, sink_for_path, to_http_file,
};
use apicontract_runner::ContractRunner;

use logging::{LogFormat, init_tracing};

const CONFIG_FILE: &str = ".apicontract.toml";

#[derive(Parser)]
#[command(name = "apicontract")]
#[command(about = "Declarative HTTP contract testing against a live API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run contract fixtures against the API host
    Run(RunArgs),

    /// Initialize config file
    Init,

    /// Export JSON Schema for the report format
    Schema,
}

#[derive(Args)]
struct RunArgs {
    /// Fixture files (replace `fixtures` from the config)
    fixtures: Vec<PathBuf>,

    /// Config file (default: .apicontract.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API host every route is appended to
    #[arg(long)]
    base_url: Option<String>,

    /// Report file
    #[arg(short, long, default_value = "apicontract-report.txt")]
    report: PathBuf,

    /// Report format (default: by report file extension)
    #[arg(long, value_enum)]
    format: Option<ReportFormatArg>,

    /// Keep request/response bodies for passing scenarios too
    #[arg(long)]
    include_bodies: bool,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Test cases run concurrently
    #[arg(long)]
    workers: Option<usize>,

    /// Judge sad paths with an expected error body by equality only
    #[arg(long)]
    lenient: bool,

    /// Exit 1 when any scenario failed
    #[arg(long)]
    fail_on_violation: bool,

    /// Write failed scenarios as a .http file
    #[arg(long)]
    reproductions: Option<PathBuf>,

    /// Show execution plan without sending requests
    #[arg(long)]
    dry_run: bool,

    /// No terminal summary; only warnings are logged
    #[arg(short, long)]
    quiet: bool,
}

impl RunArgs {
    /// Command-line values win over the config file.
    fn apply(&self, cfg: &mut Config) {
        if !self.fixtures.is_empty() {
            cfg.fixtures.clone_from(&self.fixtures);
        }
        if let Some(url) = &self.base_url {
            cfg.base_url.clone_from(url);
        }
        if self.include_bodies {
            cfg.include_bodies_on_success = true;
        }
        if let Some(timeout) = self.timeout {
            cfg.request_timeout = timeout;
        }
        if let Some(workers) = self.workers {
            cfg.workers = workers;
        }
        if self.lenient {
            cfg.strictness = Strictness::Lenient;
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormatArg {
    Text,
    Json,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Text => ReportFormat::Text,
            ReportFormatArg::Json => ReportFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let quiet = matches!(&cli.command, Commands::Run(args) if args.quiet);
    init_tracing(cli.log_format, if quiet { "warn" } else { "info" });

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Run(args) => run_contracts(&args),
        Commands::Init => {
            if Path::new(CONFIG_FILE).exists() {
                eprintln!("{CONFIG_FILE} already exists");
                return Ok(1);
            }
            std::fs::write(CONFIG_FILE, Config::example())
                .with_context(|| format!("writing {CONFIG_FILE}"))?;
            println!("Created {CONFIG_FILE}");
            println!("\nEdit the file to configure:");
            println!("  - base_url: API host to test");
            println!("  - fixtures: contract fixture files (JSON or YAML)");
            println!("  - headers: auth tokens, API keys");
            Ok(0)
        }
        Commands::Schema => {
            println!("{}", apicontract_core::schema::generate_schema()?);
            Ok(0)
        }
    }
}

fn run_contracts(args: &RunArgs) -> Result<u8> {
    let mut cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    args.apply(&mut cfg);

    if cfg.fixtures.is_empty() {
        bail!("no fixture files: pass them as arguments or set `fixtures` in {CONFIG_FILE}");
    }
    let cases = load_fixtures(&cfg.fixtures)?;

    if args.dry_run {
        let plan = DryRunPlan::build(&cfg, &cases);
        if !args.quiet {
            println!("{}", plan.to_terminal());
        }
        return Ok(if plan.has_errors() { 3 } else { 0 });
    }

    if !args.quiet {
        eprintln!("Config:");
        eprintln!("  base_url: {}", cfg.base_url);
        eprintln!("  fixtures: {} files, {} cases", cfg.fixtures.len(), cases.len());
        if !cfg.headers.is_empty() {
            eprintln!("  headers:  {} configured", cfg.headers.len());
        }
        eprintln!("  workers:  {}", cfg.worker_count());
        eprintln!();
    }

    let runner = ContractRunner::from_config(&cfg)?;
    let started = Instant::now();
    let report = runner.run_report(&cases);
    let duration = started.elapsed();

    // A failed report write is returned only after the summary and
    // reproductions are out.
    let written = sink_for_path(&args.report, args.format.map(Into::into)).write(&report);

    if let Some(path) = &args.reproductions {
        std::fs::write(path, to_http_file(&report.results))
            .with_context(|| format!("writing {}", path.display()))?;
    }

    if !args.quiet || written.is_err() {
        let verdict = if report.summary.all_passed() {
            "PASS"
        } else {
            "FAIL"
        };
        println!(
            "\n{verdict}: {} of {} scenarios passed in {:.1}s",
            report.summary.passed,
            report.summary.total_scenarios,
            duration.as_secs_f64()
        );
        println!("\n{}", render_summary(&report.summary));
        if written.is_ok() {
            println!("Report: {}", args.report.display());
        }
        if let Some(path) = &args.reproductions {
            println!("Reproductions: {}", path.display());
        }
    }

    written?;

    Ok(if args.fail_on_violation && !report.summary.all_passed() {
        1
    } else {
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn run_args(argv: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Run(args) => args,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let args = run_args(&["apicontract", "run"]);
        assert!(args.fixtures.is_empty());
        assert_eq!(args.report, PathBuf::from("apicontract-report.txt"));
        assert!(args.format.is_none());
        assert!(!args.fail_on_violation);
    }

    #[test]
    fn flags_override_config() {
        let args = run_args(&[
            "apicontract",
            "run",
            "a.json",
            "b.yaml",
            "--base-url",
            "http://staging:9000",
            "--timeout",
            "2.5",
            "--workers",
            "4",
            "--lenient",
            "--include-bodies",
        ]);
        let mut cfg = Config {
            fixtures: vec![PathBuf::from("from-config.json")],
            ..Config::default()
        };
        args.apply(&mut cfg);

        assert_eq!(
            cfg.fixtures,
            vec![PathBuf::from("a.json"), PathBuf::from("b.yaml")]
        );
        assert_eq!(cfg.base_url, "http://staging:9000");
        assert!((cfg.request_timeout - 2.5).abs() < f64::EPSILON);
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.strictness, Strictness::Lenient);
        assert!(cfg.include_bodies_on_success);
    }

    #[test]
    fn no_flags_keep_config() {
        let args = run_args(&["apicontract", "run"]);
        let mut cfg = Config {
            fixtures: vec![PathBuf::from("from-config.json")],
            workers: 3,
            ..Config::default()
        };
        args.apply(&mut cfg);
        assert_eq!(cfg.fixtures, vec![PathBuf::from("from-config.json")]);
        assert_eq!(cfg.workers, 3);
        assert_eq!(cfg.strictness, Strictness::Strict);
    }

    #[test]
    fn global_log_format_after_subcommand() {
        let cli = Cli::try_parse_from(["apicontract", "schema", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn missing_fixture_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let args = run_args(&[
            "apicontract",
            "run",
            missing.to_str().unwrap(),
            "--config",
            dir.path().join("none.toml").to_str().unwrap(),
        ]);
        // Config file itself is missing: load fails first
        assert!(run_contracts(&args).is_err());

        let cfg_path = dir.path().join("cfg.toml");
        std::fs::write(&cfg_path, "base_url = \"http://127.0.0.1:9\"\n").unwrap();
        let args = run_args(&[
            "apicontract",
            "run",
            missing.to_str().unwrap(),
            "--config",
            cfg_path.to_str().unwrap(),
        ]);
        let err = run_contracts(&args).unwrap_err();
        assert!(err.to_string().contains("Cannot read fixture"));
    }

    #[test]
    fn dry_run_sends_nothing_and_writes_no_report() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("f.json");
        std::fs::write(
            &fixture,
            r#"[{"httpVerb": "GET", "route": "/x", "sampleRequest": {},
                 "happyPathTest": {"expectedStatusCode": 200}}]"#,
        )
        .unwrap();
        let cfg_path = dir.path().join("cfg.toml");
        std::fs::write(&cfg_path, "base_url = \"http://127.0.0.1:9\"\n").unwrap();
        let report = dir.path().join("r.txt");

        let args = run_args(&[
            "apicontract",
            "run",
            fixture.to_str().unwrap(),
            "--config",
            cfg_path.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
            "--dry-run",
            "--quiet",
        ]);
        assert_eq!(run_contracts(&args).unwrap(), 0);
        assert!(!report.exists());
    }

    #[test]
    fn unreachable_host_still_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("f.json");
        std::fs::write(
            &fixture,
            r#"[{"httpVerb": "GET", "route": "/x", "sampleRequest": {},
                 "happyPathTest": {"expectedStatusCode": 200}}]"#,
        )
        .unwrap();
        let cfg_path = dir.path().join("cfg.toml");
        std::fs::write(
            &cfg_path,
            "base_url = \"http://127.0.0.1:9\"\nrequest_timeout = 2.0\n",
        )
        .unwrap();
        let report = dir.path().join("out/r.json");
        let repro = dir.path().join("failed.http");

        let base = [
            "apicontract",
            "run",
            fixture.to_str().unwrap(),
            "--config",
            cfg_path.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
            "--reproductions",
            repro.to_str().unwrap(),
            "--quiet",
        ];
        assert_eq!(run_contracts(&run_args(&base)).unwrap(), 0);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(written["results"][0]["statusCode"], "N/A");
        assert!(
            std::fs::read_to_string(&repro)
                .unwrap()
                .contains("GET http://127.0.0.1:9/x")
        );

        let mut strict = base.to_vec();
        strict.push("--fail-on-violation");
        assert_eq!(run_contracts(&run_args(&strict)).unwrap(), 1);
    }

    #[test]
    fn failed_report_write_keeps_reproductions() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("f.json");
        std::fs::write(
            &fixture,
            r#"[{"httpVerb": "GET", "route": "/x", "sampleRequest": {},
                 "happyPathTest": {"expectedStatusCode": 200}}]"#,
        )
        .unwrap();
        let cfg_path = dir.path().join("cfg.toml");
        std::fs::write(
            &cfg_path,
            "base_url = \"http://127.0.0.1:9\"\nrequest_timeout = 2.0\n",
        )
        .unwrap();
        // Parent of the report is a regular file, so the write must fail
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let report = blocker.join("r.txt");
        let repro = dir.path().join("failed.http");

        let args = run_args(&[
            "apicontract",
            "run",
            fixture.to_str().unwrap(),
            "--config",
            cfg_path.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
            "--reproductions",
            repro.to_str().unwrap(),
            "--quiet",
        ]);
        assert!(run_contracts(&args).is_err());
        assert!(
            std::fs::read_to_string(&repro)
                .unwrap()
                .contains("GET http://127.0.0.1:9/x")
        );
    }
}

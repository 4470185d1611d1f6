// # zonectl - declarative DNS runner
//
// Thin integration layer over zonectl-core:
// 1. Reading configuration from environment variables
// 2. Initializing tracing and the runtime
// 3. Loading and normalizing the DNS configuration
// 4. Registering adapters and running the orchestrator
//
// All reconciliation logic lives in zonectl-core.
//
// ## Usage
//
// ```bash
// zonectl preview
// zonectl push
// ```
//
// ## Configuration
//
// - `ZONECTL_CONFIG`: DNS configuration file (default `dnsconfig.json`)
// - `ZONECTL_CREDS`: provider credentials file (default `creds.json`, optional)
// - `ZONECTL_DOMAINS`: comma-separated domains to run (default: all)
// - `ZONECTL_PROVIDERS`: comma-separated providers to run, `all` includes
//   opt-in providers (default: every default provider)
// - `ZONECTL_INTERACTIVE`: `true` to confirm each correction during push
// - `ZONECTL_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
//
// ## Exit codes
//
// - 0: every correction succeeded (or nothing to do)
// - 1: configuration or validation error
// - 2: run completed with errors
// - 3: integrity violation

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use zonectl_core::{
    Error, Orchestrator, ProviderRegistry, RunMode, RunSummary, SelectionFilter,
    load_dns_config, load_provider_configs, normalize_and_validate_config,
};

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonectlExitCode {
    Success = 0,
    /// Configuration or validation error
    ConfigError = 1,
    /// At least one provider or correction failed
    CompletedWithErrors = 2,
    /// A broken internal invariant
    IntegrityViolation = 3,
}

impl From<ZonectlExitCode> for ExitCode {
    fn from(code: ZonectlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    mode: RunMode,
    config_path: String,
    creds_path: String,
    domains: String,
    providers: String,
    interactive: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from the command line and environment variables
    fn from_env() -> Result<Self> {
        let mode = match env::args().nth(1).as_deref() {
            Some("preview") => RunMode::Preview,
            Some("push") => RunMode::Push,
            Some(other) => bail!("Unknown command '{}'. Usage: zonectl preview|push", other),
            None => bail!("Missing command. Usage: zonectl preview|push"),
        };

        Ok(Self {
            mode,
            config_path: env::var("ZONECTL_CONFIG").unwrap_or_else(|_| "dnsconfig.json".to_string()),
            creds_path: env::var("ZONECTL_CREDS").unwrap_or_else(|_| "creds.json".to_string()),
            domains: env::var("ZONECTL_DOMAINS").unwrap_or_default(),
            providers: env::var("ZONECTL_PROVIDERS").unwrap_or_default(),
            interactive: env::var("ZONECTL_INTERACTIVE")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            log_level: env::var("ZONECTL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.config_path.trim().is_empty() {
            bail!("ZONECTL_CONFIG cannot be empty");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => bail!(
                "ZONECTL_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        if self.interactive && self.mode == RunMode::Preview {
            eprintln!("WARNING: ZONECTL_INTERACTIVE has no effect on preview");
        }

        Ok(())
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Why a run ended before the orchestrator finished
enum Abort {
    Config(anyhow::Error),
    Validation(Vec<Error>),
    Integrity(Error),
    Runtime(anyhow::Error),
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ZonectlExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ZonectlExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonectlExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonectlExitCode::CompletedWithErrors.into();
        }
    };

    let code = match rt.block_on(run(&config)) {
        Ok(summary) => {
            teamcity_status(&summary);
            if summary.any_errors {
                eprintln!("Completed with errors");
                ZonectlExitCode::CompletedWithErrors
            } else {
                ZonectlExitCode::Success
            }
        }
        Err(Abort::Config(e)) => {
            error!("{:#}", e);
            ZonectlExitCode::ConfigError
        }
        Err(Abort::Validation(errors)) => {
            for e in &errors {
                eprintln!("{}", e);
            }
            eprintln!("{} validation error(s); nothing was sent to any provider", errors.len());
            ZonectlExitCode::ConfigError
        }
        Err(Abort::Integrity(e)) => {
            eprintln!("FATAL: {}", e);
            ZonectlExitCode::IntegrityViolation
        }
        Err(Abort::Runtime(e)) => {
            error!("{:#}", e);
            ZonectlExitCode::CompletedWithErrors
        }
    };

    code.into()
}

async fn run(config: &Config) -> std::result::Result<RunSummary, Abort> {
    let mut dns_config = load_dns_config(&config.config_path)
        .await
        .with_context(|| format!("loading {}", config.config_path))
        .map_err(Abort::Config)?;

    let errors = normalize_and_validate_config(&mut dns_config);
    if let Some(pos) = errors.iter().position(Error::is_integrity) {
        let mut errors = errors;
        return Err(Abort::Integrity(errors.swap_remove(pos)));
    }
    if !errors.is_empty() {
        return Err(Abort::Validation(errors));
    }

    let creds = load_provider_configs(&config.creds_path)
        .await
        .with_context(|| format!("loading {}", config.creds_path))
        .map_err(Abort::Config)?;

    let registry = ProviderRegistry::new();
    zonectl_core::providers::register_builtin(&registry);
    let providers = registry
        .initialize(&dns_config, &creds)
        .context("initializing providers")
        .map_err(Abort::Config)?;

    info!(
        "Running {} domain(s) in {:?} mode",
        dns_config.domains.len(),
        config.mode
    );

    Orchestrator::new(config.mode)
        .interactive(config.interactive)
        .with_filter(SelectionFilter::from_lists(&config.domains, &config.providers))
        .run(&dns_config, &providers)
        .await
        .map_err(|e| {
            if e.is_integrity() {
                Abort::Integrity(e)
            } else {
                Abort::Runtime(e.into())
            }
        })
}

/// Report the outcome to TeamCity when running under it
fn teamcity_status(summary: &RunSummary) {
    if env::var_os("TEAMCITY_VERSION").is_none() {
        return;
    }
    if summary.any_errors {
        eprintln!("##teamcity[buildStatus status='FAILURE' text='completed with errors']");
    } else {
        eprintln!(
            "##teamcity[buildStatus status='SUCCESS' text='{} corrections']",
            summary.total_corrections
        );
    }
}

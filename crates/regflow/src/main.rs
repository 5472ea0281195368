// # regflow - domain reconciliation CLI
//
// This is a THIN integration layer only:
// - No reconciliation logic lives here; all of it is in regflow-core
// - Configuration is via environment variables only
//
// The binary is responsible for:
// 1. Parsing the command line
// 2. Reading configuration from environment variables
// 3. Initializing logging and the runtime
// 4. Registering and selecting providers
// 5. Running one pass and printing its report
//
// ## Configuration
//
// ### Registrar (Namecheap)
// - `NAMECHEAP_API_USER`, `NAMECHEAP_API_KEY`, `NAMECHEAP_USERNAME`
// - `NAMECHEAP_CLIENT_IP`: Whitelisted client IP
// - `NAMECHEAP_SANDBOX`: Use the sandbox endpoint (default: false)
// - `NAMECHEAP_REGISTRATION_YEARS`: Registration period (default: 1)
// - `NAMECHEAP_REGISTRANT_*`: Contact used for new registrations
//
// ### Edge provider (Cloudflare)
// - `CLOUDFLARE_API_TOKEN`: API token
// - `CLOUDFLARE_ACCOUNT_ID`: Account for new zones (optional)
//
// ### Engine
// - `REGFLOW_CLOSING_PROBE`: Re-probe after changes (default: true)
// - `REGFLOW_LOG_LEVEL`: trace, debug, info, warn, error (default: warn)
//
// ## Example
//
// ```bash
// regflow example.com --status
// regflow example.com --dry-run
// regflow example.com --force-registration --json
// ```

mod config;
mod output;
mod prompt;

use clap::Parser;
use config::Config;
use regflow_core::{DomainName, ProviderRegistry, ReconcileEngine, RunMode, RunRequest};
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different outcomes
#[derive(Debug, Clone, Copy)]
enum RegflowExitCode {
    /// The pass completed without failures
    Success = 0,
    /// Invalid arguments or configuration
    ConfigError = 1,
    /// An action failed or planning was blocked
    ReconcileFailure = 2,
    /// Logging or the async runtime could not be initialized
    RuntimeError = 3,
}

impl From<RegflowExitCode> for ExitCode {
    fn from(code: RegflowExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Bring a domain's registrar and edge provider into a consistent state
#[derive(Parser, Debug)]
#[command(name = "regflow", version)]
struct Cli {
    /// Domain to reconcile (e.g. example.com)
    domain: String,

    /// Report the current state only; never changes anything
    #[arg(long)]
    status: bool,

    /// Probe, plan and apply (the default)
    #[arg(long)]
    setup: bool,

    /// Show what setup would do without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Allow registering the domain if it is not registered (asks first)
    #[arg(long)]
    force_registration: bool,

    /// Skip the worker subdomain
    #[arg(long)]
    no_workers: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn request(&self, domain: DomainName) -> RunRequest {
        let request = if self.status {
            RunRequest::status(domain)
        } else {
            RunRequest::setup(domain)
        };
        request
            .with_dry_run(self.dry_run)
            .with_allow_registration(self.force_registration)
            .with_worker_subdomain(!self.no_workers)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                RegflowExitCode::ConfigError.into()
            } else {
                RegflowExitCode::Success.into()
            };
        }
    };

    let domain = match DomainName::parse(&cli.domain) {
        Ok(domain) => domain,
        Err(e) => {
            eprintln!("Invalid domain: {}", e);
            return RegflowExitCode::ConfigError.into();
        }
    };

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return RegflowExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return RegflowExitCode::ConfigError.into();
    }

    // Fail before any prompt if a registration could not be submitted
    if cli.force_registration
        && !cli.status
        && let Err(e) = config.validate_registration()
    {
        eprintln!("Configuration validation error: {}", e);
        return RegflowExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return RegflowExitCode::RuntimeError.into();
    }

    let engine = match build_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return RegflowExitCode::ConfigError.into();
        }
    };

    // Providers are awaited one call at a time
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RegflowExitCode::RuntimeError.into();
        }
    };

    let request = cli.request(domain);
    if request.mode == RunMode::Status && cli.setup {
        info!("Both --status and --setup given; running status");
    }

    let report = rt.block_on(engine.run(&request, &prompt::TerminalConfirm));

    if cli.json {
        match output::render_json(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return RegflowExitCode::RuntimeError.into();
            }
        }
    } else {
        print!("{}", output::render(&report));
    }

    if report.is_success() {
        RegflowExitCode::Success.into()
    } else {
        RegflowExitCode::ReconcileFailure.into()
    }
}

/// Select the registrar and edge provider from configuration
fn build_engine(config: &Config) -> anyhow::Result<ReconcileEngine> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "namecheap")]
    {
        info!("Registering Namecheap registrar");
        regflow_registrar_namecheap::register(&registry);
    }

    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare provider");
        regflow_provider_cloudflare::register(&registry);
    }

    let registrar = registry.create_registrar(&config.regflow.registrar)?;
    let dns = registry.create_dns_provider(&config.regflow.provider)?;
    info!(
        "Using registrar {} and edge provider {}",
        registrar.provider_name(),
        dns.provider_name()
    );

    Ok(ReconcileEngine::new(
        registrar,
        dns,
        config.regflow.reconcile.clone(),
    ))
}

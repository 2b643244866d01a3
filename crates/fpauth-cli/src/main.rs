//! fpauth CLI - Drive fingerprint authentication sessions against a simulated device
//!
//! Every command prints its result as JSON on stdout. Logs go to stderr and are
//! filtered through `RUST_LOG` (default `fpauth=info`).

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fpauth_core::sim::{CeremonyScript, DeviceProfile, SimEvent, SimulatedPlatform};
use fpauth_core::{
    Admission, AuthConfig, AuthenticationSession, BridgeReply, FingerprintAuthModule,
    LifecycleTracker,
};

use crate::config::{config_path, CliConfig};

#[derive(Parser)]
#[command(name = "fpauth")]
#[command(about = "Single-flight fingerprint authentication over a simulated device", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to $FPAUTH_CONFIG, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    device: DeviceArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the configured device profile
#[derive(Args, Debug, Default)]
struct DeviceArgs {
    /// Platform API level
    #[arg(long, global = true)]
    api_level: Option<u32>,

    /// Detach the foreground host context
    #[arg(long, global = true)]
    no_host: bool,

    /// Remove the fingerprint sensor
    #[arg(long, global = true)]
    no_hardware: bool,

    /// Disable the secure lock screen
    #[arg(long, global = true)]
    insecure: bool,

    /// Number of enrolled fingerprints
    #[arg(long, global = true)]
    enrolled: Option<u32>,

    /// Raw unified biometric manager result code
    #[arg(long, global = true)]
    biometric_code: Option<i32>,

    /// Hide the unified biometric manager from the host
    #[arg(long, global = true)]
    no_biometric_manager: bool,

    /// Make keystore credential creation fail
    #[arg(long, global = true)]
    no_credential: bool,

    /// Leave the host in the background
    #[arg(long, global = true)]
    background: bool,
}

impl DeviceArgs {
    fn apply(&self, profile: &mut DeviceProfile) {
        if let Some(api_level) = self.api_level {
            profile.api_level = api_level;
        }
        if self.no_host {
            profile.host_present = false;
        }
        if self.no_hardware {
            profile.hardware_present = false;
        }
        if self.insecure {
            profile.keyguard_secure = false;
        }
        if let Some(enrolled) = self.enrolled {
            profile.enrolled = enrolled;
        }
        if let Some(code) = self.biometric_code {
            profile.biometric_code = Some(code);
        }
        if self.no_biometric_manager {
            profile.biometric_manager_present = false;
        }
        if self.no_credential {
            profile.credential_available = false;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether biometric authentication can be used
    IsSupported,

    /// Show the probed capability tier and status
    Probe,

    /// Run one authentication attempt
    Authenticate {
        /// Purpose string shown to the user
        #[arg(short, long, default_value = "")]
        reason: String,

        /// Prompt heading
        #[arg(long)]
        title: Option<String>,

        /// Cancel button label
        #[arg(long)]
        cancel_text: Option<String>,

        /// How the simulated user responds
        #[arg(short, long, value_enum)]
        outcome: Option<SimOutcome>,

        /// Message carried by help and error outcomes
        #[arg(short, long, default_value = "Simulated sensor message")]
        message: String,

        /// How long to wait for the terminal result
        #[arg(long, default_value_t = 2000)]
        timeout_ms: u64,
    },

    /// Feed raw bridge requests (JSON, one per argument) to the module in order
    Request {
        #[arg(required = true)]
        requests: Vec<String>,

        /// How long to wait for each reply
        #[arg(long, default_value_t = 2000)]
        timeout_ms: u64,
    },

    /// Write the default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SimOutcome {
    Success,
    Cancel,
    Error,
    Failed,
    Help,
}

impl SimOutcome {
    fn event(self, message: &str) -> SimEvent {
        match self {
            SimOutcome::Success => SimEvent::Success,
            SimOutcome::Cancel => SimEvent::Cancel,
            SimOutcome::Failed => SimEvent::Failed,
            SimOutcome::Error => SimEvent::Error {
                message: message.to_string(),
            },
            SimOutcome::Help => SimEvent::Help {
                message: message.to_string(),
            },
        }
    }
}

/// Result line for calls that end without a reply
#[derive(Serialize)]
#[serde(tag = "type")]
enum Silent {
    /// Rejected before any callback could fire
    Rejected { reason: String },
    /// No terminal result arrived in time
    Timeout { waited_ms: u64 },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

struct Harness {
    session: Arc<AuthenticationSession>,
    platform: SimulatedPlatform,
}

impl Harness {
    fn new(config: &CliConfig, device: &DeviceArgs) -> Result<Self> {
        let mut profile = config.device.clone();
        device.apply(&mut profile);
        debug!("Device profile: {:?}", profile);

        let platform = SimulatedPlatform::new(profile);
        let lifecycle = Arc::new(LifecycleTracker::new());
        if !device.background {
            lifecycle.on_host_resume();
        }

        let session = AuthenticationSession::new(
            config.session.clone(),
            Arc::new(platform.clone()),
            platform.credential_provider_for(&config.session.credential_alias),
            lifecycle,
        )
        .context("Failed to start authentication session")?;

        Ok(Self {
            session: Arc::new(session),
            platform,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fpauth=info,fpauth_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let path = config_path(cli.config.clone());

    if let Commands::InitConfig { force } = cli.command {
        return init_config(path, force);
    }

    let config = CliConfig::load_or_create(&path)?;
    let harness = Harness::new(&config, &cli.device)?;

    let result = match cli.command {
        Commands::IsSupported => print_json(&BridgeReply::from(harness.session.is_supported())),
        Commands::Probe => print_json(&harness.session.probe()),
        Commands::Authenticate {
            reason,
            title,
            cancel_text,
            outcome,
            message,
            timeout_ms,
        } => {
            if let Some(outcome) = outcome {
                let script = CeremonyScript::Play(vec![outcome.event(&message)]);
                harness.platform.update_profile(|profile| {
                    profile.legacy_script = script.clone();
                    profile.modern_script = script;
                });
            }

            let auth_config = AuthConfig {
                title,
                cancel_text,
                reason: None,
            };
            authenticate(&harness, &reason, &auth_config, timeout_ms).await
        }
        Commands::Request {
            requests,
            timeout_ms,
        } => run_requests(&harness, &requests, timeout_ms).await,
        Commands::InitConfig { .. } => Ok(()),
    };

    harness.session.shutdown();
    result
}

fn init_config(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("Config already exists at {:?} (use --force to overwrite)", path);
    }
    CliConfig::default().save(&path)?;
    info!("Wrote default config to {:?}", path);
    print_json(&serde_json::json!({ "config": path }))
}

async fn authenticate(
    harness: &Harness,
    reason: &str,
    auth_config: &AuthConfig,
    timeout_ms: u64,
) -> Result<()> {
    let rx = match harness.session.authenticate_async(reason, auth_config) {
        Ok(rx) => rx,
        Err(rejection) => {
            return print_json(&Silent::Rejected {
                reason: format!("{:?}", rejection),
            })
        }
    };

    match wait_for(rx, timeout_ms).await {
        Some(result) => print_json(&BridgeReply::from(result)),
        None => print_json(&Silent::Timeout {
            waited_ms: timeout_ms,
        }),
    }
}

async fn run_requests(harness: &Harness, requests: &[String], timeout_ms: u64) -> Result<()> {
    let module = FingerprintAuthModule::new(Arc::clone(&harness.session));
    info!("Driving bridge module {}", module.name());

    for line in requests {
        let (tx, rx) = oneshot::channel();
        let admission = module.handle_json(line, move |reply| {
            let _ = tx.send(reply);
        });

        if let Admission::Rejected(rejection) = admission {
            print_json(&Silent::Rejected {
                reason: format!("{:?}", rejection),
            })?;
            continue;
        }

        match wait_for(rx, timeout_ms).await {
            Some(reply) => print_json(&reply)?,
            None => print_json(&Silent::Timeout {
                waited_ms: timeout_ms,
            })?,
        }
    }

    Ok(())
}

async fn wait_for<T>(rx: oneshot::Receiver<T>, timeout_ms: u64) -> Option<T> {
    match tokio::time::timeout(Duration::from_millis(timeout_ms), rx).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(_)) => {
            warn!("Attempt ended without a result");
            None
        }
        Err(_) => {
            warn!("No result after {}ms", timeout_ms);
            None
        }
    }
}

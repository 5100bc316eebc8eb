use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use nest_client::config::Config;
use nest_client::models::nest::{DeviceId, TemperatureScale};
use nest_client::{NestClient, Session, Setpoint, TemperatureAdjustment};
use serde::Serialize;
use std::path::PathBuf;

/// Command-line access to the Nest developer API
#[derive(Parser, Debug)]
#[command(name = "nest", version, about)]
struct Cli {
    /// Env file to load instead of `.env` in the working directory
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the URL the user must visit to authorize this client
    AuthUrl,
    /// Exchange an authorization code for an access token
    Exchange { code: String },
    /// List thermostats and smoke/CO alarms
    Devices,
    /// List structures
    Structures,
    /// Show a single thermostat
    Thermostat { device_id: String },
    /// Change a thermostat's target temperature
    SetTemperature {
        device_id: String,
        #[arg(allow_negative_numbers = true)]
        degrees: f64,
        #[arg(long, value_enum)]
        scale: ScaleArg,
        /// Required in heat-cool mode, rejected otherwise
        #[arg(long, value_enum)]
        setpoint: Option<SetpointArg>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScaleArg {
    C,
    F,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SetpointArg {
    High,
    Low,
}

impl From<ScaleArg> for TemperatureScale {
    fn from(value: ScaleArg) -> Self {
        match value {
            ScaleArg::C => TemperatureScale::C,
            ScaleArg::F => TemperatureScale::F,
        }
    }
}

impl From<SetpointArg> for Setpoint {
    fn from(value: SetpointArg) -> Self {
        match value {
            SetpointArg::High => Setpoint::High,
            SetpointArg::Low => Setpoint::Low,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| format!("serializing output failed: {}", e))?;
    println!("{}", text);
    Ok(())
}

fn require_session(cfg: &Config) -> Result<&Session, String> {
    cfg.session.as_ref().ok_or_else(|| {
        "No access token: run `nest exchange <code>` and set NEST_ACCESS_TOKEN/NEST_TOKEN_EXPIRES_AT".to_string()
    })
}

fn run(command: Command) -> Result<(), String> {
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (api_base={}, token_url={}, session={})",
        cfg.endpoints.api_base,
        cfg.endpoints.token_url,
        cfg.session
            .as_ref()
            .map(|s| format!("expires {}", s.expires_at().to_rfc3339()))
            .unwrap_or_else(|| "-".to_string())
    );
    let client = NestClient::with_endpoints(cfg.credentials.clone(), cfg.endpoints.clone());

    match command {
        Command::AuthUrl => {
            let req = client
                .authorization_request()
                .map_err(|e| format!("building authorization url failed: {}", e))?;
            println!("{}", req.url);
            info!("Expect state={} on the redirect", req.state);
        }
        Command::Exchange { code } => {
            let session = client
                .exchange_code(&code)
                .map_err(|e| format!("token exchange failed: {}", e))?;
            println!("NEST_ACCESS_TOKEN={}", session.access_token());
            println!("NEST_TOKEN_EXPIRES_AT={}", session.expires_at().to_rfc3339());
        }
        Command::Devices => {
            let devices = client
                .get_devices(require_session(&cfg)?)
                .map_err(|e| format!("get_devices failed: {}", e))?;
            info!(
                "Found {} thermostat(s), {} smoke/CO alarm(s)",
                devices.thermostats.len(),
                devices.smoke_co_alarms.len()
            );
            print_json(&devices)?;
        }
        Command::Structures => {
            let structures = client
                .get_structures(require_session(&cfg)?)
                .map_err(|e| format!("get_structures failed: {}", e))?;
            print_json(&structures)?;
        }
        Command::Thermostat { device_id } => {
            let thermostat = client
                .get_thermostat(require_session(&cfg)?, &DeviceId(device_id.clone()))
                .map_err(|e| format!("get_thermostat({device_id}) failed: {}", e))?;
            print_json(&thermostat)?;
        }
        Command::SetTemperature {
            device_id,
            degrees,
            scale,
            setpoint,
        } => {
            let adjustment = TemperatureAdjustment::new(degrees, scale.into(), setpoint.map(Into::into));
            let response = client
                .adjust_temperature(require_session(&cfg)?, &DeviceId(device_id.clone()), &adjustment)
                .map_err(|e| format!("adjust_temperature({device_id}) failed: {}", e))?;
            print_json(&response)?;
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Variables already present in the process environment take precedence.
    let loaded_env = match &cli.env_file {
        Some(path) => match dotenvy::from_path(path) {
            Ok(()) => Some(path.clone()),
            Err(e) => {
                eprintln!("fatal: failed to load env file {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => dotenvy::dotenv().ok(),
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(path) = loaded_env.as_ref() {
        info!("Environment loaded from {}", path.display());
    }

    info!(
        "nest-client {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run(cli.command) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}

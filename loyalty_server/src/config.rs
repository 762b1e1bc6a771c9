use std::{env, time::Duration};

use log::*;
use loyalty_engine::accrual::DEFAULT_ACCRUAL_TIMEOUT;
use lpg_common::{
    helpers::{parse_boolean_flag, parse_duration},
    Secret,
};
use rand::{thread_rng, RngCore};

use crate::cli::Cli;

const DEFAULT_LPG_HOST: &str = "127.0.0.1";
const DEFAULT_LPG_PORT: u16 = 8081;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/loyalty.db";
const DEFAULT_ACCRUAL_SYSTEM_ADDRESS: &str = "http://localhost:8080/api";
const DEFAULT_ACCRUAL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60);
const DEFAULT_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// If true, the database schema is brought up to date before the server starts listening.
    pub run_migrations: bool,
    pub accrual: AccrualConfig,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LPG_HOST.to_string(),
            port: DEFAULT_LPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            run_migrations: true,
            accrual: AccrualConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let (host, port) = env::var("LPG_RUN_ADDRESS")
            .ok()
            .and_then(|s| {
                split_run_address(&s)
                    .map_err(|e| error!("🪛️ {e} [LPG_RUN_ADDRESS]. Using the default, {DEFAULT_LPG_HOST}:{DEFAULT_LPG_PORT}."))
                    .ok()
            })
            .unwrap_or_else(|| (DEFAULT_LPG_HOST.to_string(), DEFAULT_LPG_PORT));
        let database_url = env::var("LPG_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ LPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = env::var("LPG_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .or_else(|| {
                        error!("🪛️ {s} is not a valid value for LPG_MAX_CONNECTIONS. Using the default, {DEFAULT_MAX_CONNECTIONS}.");
                        None
                    })
            })
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let run_migrations = parse_boolean_flag(env::var("LPG_RUN_MIGRATIONS").ok(), true);
        let accrual = AccrualConfig::from_env_or_default();
        let auth = AuthConfig::from_env_or_default();
        Self { host, port, database_url, max_connections, run_migrations, accrual, auth }
    }

    /// Command-line flags win over whatever was read from the environment.
    pub fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(address) = &cli.run_address {
            match split_run_address(address) {
                Ok((host, port)) => {
                    self.host = host;
                    self.port = port;
                },
                Err(e) => error!("🪛️ {e} [-a]. Keeping {}:{}.", self.host, self.port),
            }
        }
        if let Some(url) = &cli.database_url {
            self.database_url = url.clone();
        }
        if let Some(address) = &cli.accrual_address {
            self.accrual.base_url = address.clone();
        }
        if let Some(interval) = cli.accrual_interval {
            self.accrual.interval = interval;
        }
        if let Some(secret) = &cli.jwt_secret {
            self.auth.jwt_secret = Secret::new(secret.clone());
        }
        if let Some(lifetime) = cli.token_lifetime {
            self.auth.token_lifetime = lifetime;
        }
    }

    pub fn run_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Splits `host:port`. The host may be empty (`:8081`), in which case the server listens on all interfaces.
pub fn split_run_address(address: &str) -> Result<(String, u16), String> {
    let (host, port) =
        address.trim().rsplit_once(':').ok_or_else(|| format!("'{address}' is not a valid host:port address"))?;
    let port = port.parse::<u16>().map_err(|e| format!("'{port}' is not a valid port. {e}"))?;
    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Ok((host.to_string(), port))
}

//-------------------------------------------------  AccrualConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct AccrualConfig {
    /// Base URL of the accrual authority. Orders are queried at `{base_url}/orders/{number}`.
    pub base_url: String,
    /// Time between reconciliation passes.
    pub interval: Duration,
    /// Upper bound on a single request to the accrual authority.
    pub timeout: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ACCRUAL_SYSTEM_ADDRESS.to_string(),
            interval: DEFAULT_ACCRUAL_INTERVAL,
            timeout: DEFAULT_ACCRUAL_TIMEOUT,
        }
    }
}

impl AccrualConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("LPG_ACCRUAL_SYSTEM_ADDRESS").ok().unwrap_or_else(|| {
            info!("🪛️ LPG_ACCRUAL_SYSTEM_ADDRESS is not set. Using the default, {DEFAULT_ACCRUAL_SYSTEM_ADDRESS}.");
            DEFAULT_ACCRUAL_SYSTEM_ADDRESS.to_string()
        });
        let interval = duration_from_env("LPG_ACCRUAL_INTERVAL", DEFAULT_ACCRUAL_INTERVAL);
        let timeout = duration_from_env("LPG_ACCRUAL_TIMEOUT", DEFAULT_ACCRUAL_TIMEOUT);
        Self { base_url, interval, timeout }
    }
}

fn duration_from_env(name: &str, default: Duration) -> Duration {
    match env::var(name) {
        Ok(s) => parse_duration(&s).ok().filter(|d| !d.is_zero()).unwrap_or_else(|| {
            warn!("🪛️ Invalid configuration value for {name}: '{s}'. Using the default of {default:?}.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default of {default:?}.");
            default
        },
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 key used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing key has not been set. I'm using a random value for this session. Every access \
             token will be invalidated when the server restarts. Set LPG_JWT_SECRET for production use. 🚨️🚨️🚨️"
        );
        Self { jwt_secret: Secret::new(random_secret()), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: &str, token_lifetime: Duration) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.to_string()), token_lifetime }
    }

    pub fn from_env_or_default() -> Self {
        let token_lifetime = duration_from_env("LPG_JWT_LIFETIME", DEFAULT_TOKEN_LIFETIME);
        match env::var("LPG_JWT_SECRET") {
            Ok(s) if !s.trim().is_empty() => Self::new(s.trim(), token_lifetime),
            _ => Self { token_lifetime, ..Default::default() },
        }
    }
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

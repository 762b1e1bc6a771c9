use std::{env, env::VarError, time::Duration};

use clap::Parser;
use lpg_common::helpers::parse_duration;

/// Loyalty points gateway. Every option can also be set with the environment variable shown in its description.
/// Flags take precedence over the environment.
#[derive(Debug, Default, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Address to listen on, as host:port [LPG_RUN_ADDRESS]
    #[arg(short = 'a', long = "address")]
    pub run_address: Option<String>,
    /// Database URL, e.g. sqlite://data/loyalty.db [LPG_DATABASE_URL]
    #[arg(short = 'd', long = "database")]
    pub database_url: Option<String>,
    /// Base URL of the accrual authority [LPG_ACCRUAL_SYSTEM_ADDRESS]
    #[arg(short = 'r', long = "accrual")]
    pub accrual_address: Option<String>,
    /// Time between reconciliation passes, e.g. 2s or 500ms [LPG_ACCRUAL_INTERVAL]
    #[arg(short = 'i', long = "interval", value_parser = parse_duration)]
    pub accrual_interval: Option<Duration>,
    /// Key used to sign access tokens [LPG_JWT_SECRET]
    #[arg(short = 'k', long = "key")]
    pub jwt_secret: Option<String>,
    /// How long access tokens remain valid, e.g. 60m [LPG_JWT_LIFETIME]
    #[arg(short = 't', long = "token-lifetime", value_parser = parse_duration)]
    pub token_lifetime: Option<Duration>,
    /// Print the current (non-secret) environment configuration and exit
    #[arg(long)]
    pub envs: bool,
}

pub fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 9] = [
        "RUST_LOG",
        "LPG_RUN_ADDRESS",
        "LPG_DATABASE_URL",
        "LPG_ACCRUAL_SYSTEM_ADDRESS",
        "LPG_ACCRUAL_INTERVAL",
        "LPG_ACCRUAL_TIMEOUT",
        "LPG_JWT_LIFETIME",
        "LPG_MAX_CONNECTIONS",
        "LPG_RUN_MIGRATIONS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}

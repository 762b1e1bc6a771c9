use clap::Parser;
use dotenvy::dotenv;
use log::info;
use loyalty_server::{
    cli::{display_envs, Cli},
    config::ServerConfig,
    server::run_server,
};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let cli = Cli::parse();
    if cli.envs {
        display_envs();
        return;
    }
    let mut config = ServerConfig::from_env_or_default();
    config.apply_cli_overrides(&cli);

    info!("🚀️ Starting server on {}", config.run_address());
    match run_server(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}

use log::info;
use report_console::{ConsoleConfig, app};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Positional arguments win over the environment: [bind_addr] [api_base_url]
    let args: Vec<String> = env::args().skip(1).collect();
    let config = ConsoleConfig::from_env().with_args(&args);

    info!("Starting report console");
    app::run(config).await?;

    Ok(())
}

mod api;
mod cli;
mod services;

use api::api;
use cli::cli;
use services::shared::logger::init_logger;

async fn run_fxbot() -> anyhow::Result<()> {
    init_logger();
    cli().await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    run_fxbot().await?;
    Ok(())
}

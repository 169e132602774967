pub mod chat;
pub mod rates;

use std::sync::Arc;

use chat::chat;
use clap::{Parser, Subcommand};
use rates::rates;

use crate::{
    api,
    services::{
        conversation::{ConversationService, InMemoryStore},
        currencies::Currency,
        market_data::fx_rates::ExchangeRateApiClient,
        shared::env::{check_for_env_variables, get_env_variable_or},
        telegram::TelegramBot,
    },
};

const DEFAULT_API_PORT: u16 = 8084;

#[derive(Parser, Debug)]
#[command(about = "Currency converter chat bot")]
struct Args {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    /// Run the bot against the Telegram Bot API
    Telegram,
    /// Chat with the bot in this terminal
    Chat,
    /// Serve the conversation over HTTP
    Api {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print all rates for one base currency
    Rates { base: Currency },
}

fn conversation_service(rate_client: Arc<ExchangeRateApiClient>) -> Arc<ConversationService> {
    Arc::new(ConversationService::new(
        Arc::new(InMemoryStore::new()),
        rate_client,
    ))
}

pub async fn cli() -> anyhow::Result<()> {
    let args = Args::parse();
    let args = args.cmd;
    check_for_env_variables(args == Command::Telegram)?;
    let rate_client = Arc::new(ExchangeRateApiClient::from_env()?);

    match args {
        Command::Telegram => {
            let bot = TelegramBot::from_env()?;
            bot.run(conversation_service(rate_client)).await?;
        }
        Command::Chat => {
            chat(&conversation_service(rate_client)).await?;
        }
        Command::Api { port } => {
            let port = port.unwrap_or_else(|| get_env_variable_or("API_PORT", DEFAULT_API_PORT));
            println!("Starting web server...");
            api(conversation_service(rate_client), port).await?;
        }
        Command::Rates { base } => {
            rates(base, rate_client.as_ref()).await?;
        }
    }
    Ok(())
}

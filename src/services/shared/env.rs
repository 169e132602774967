use dotenvy::{dotenv, from_filename, var};

pub fn check_for_env_variables(needs_telegram: bool) -> anyhow::Result<()> {
    // the rate API key is needed by every mode, the bot token only when talking to Telegram
    match get_env_variable("EXCHANGERATE_API_KEY") {
        Some(_) => println!("Exchange rate API key set ✅"),
        None => anyhow::bail!(
            "Please create an API key via exchangerate-api.com and set it as EXCHANGERATE_API_KEY in your environment variables"
        ),
    };
    match get_env_variable("TELEGRAM_BOT_TOKEN") {
        Some(_) => println!("Telegram bot token set ✅"),
        None if needs_telegram => anyhow::bail!(
            "Please create a bot via @BotFather and set its token as TELEGRAM_BOT_TOKEN"
        ),
        None => println!("TELEGRAM_BOT_TOKEN not set, the Telegram bot can't be started. ⚠️"),
    };
    if let Some(url) = get_env_variable("EXCHANGERATE_API_URL") {
        println!("Using custom exchange rate API at {} ⚠️", url);
    }
    Ok(())
}

pub fn get_env_variable(variable_to_get: &str) -> Option<String> {
    let environment = var("RUST_ENV").unwrap_or_else(|_| "development".into());

    match environment.as_str() {
        "development" => from_filename(".env.dev").ok(),
        "production" => from_filename(".env.prod").ok(),
        _ => dotenv().ok(),
    };
    var(variable_to_get).ok()
}

pub fn get_env_variable_or<T: std::str::FromStr>(variable_to_get: &str, default: T) -> T {
    get_env_variable(variable_to_get)
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use crate::services::conversation::{ConversationService, RenderedMessage, UserId};

const CONSOLE_USER: UserId = UserId(0);

fn print_reply(reply: &RenderedMessage) {
    println!("{}", reply.text.green());
    for row in reply.menu.rows() {
        let buttons: Vec<String> = row
            .iter()
            .map(|label| format!("[{}]", label).cyan().to_string())
            .collect();
        println!("  {}", buttons.join(" "));
    }
}

/// Talks to the bot from the terminal; type a button label or an amount.
pub async fn chat(service: &ConversationService) -> anyhow::Result<()> {
    if let Some(reply) = service.handle(CONSOLE_USER, "/start").await {
        print_reply(&reply);
    }

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match service.handle(CONSOLE_USER, &line).await {
            Some(reply) => print_reply(&reply),
            None => println!("{}", "(no reply)".dimmed()),
        }
    }
    Ok(())
}

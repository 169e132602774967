use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::services::{
    conversation::{ConversationService, RenderedMessage, UserId},
    shared::env::get_env_variable,
};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
const POLL_TIMEOUT_SECS: u64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Deserialize, Debug)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Deserialize, Debug)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Chat {
    pub id: i64,
}

#[derive(Serialize, Debug)]
struct KeyboardButton {
    text: String,
}

#[derive(Serialize, Debug)]
struct ReplyKeyboardMarkup {
    keyboard: Vec<Vec<KeyboardButton>>,
    resize_keyboard: bool,
}

#[derive(Serialize, Debug)]
struct SendMessageRequest {
    chat_id: i64,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyKeyboardMarkup>,
}

impl SendMessageRequest {
    fn new(chat_id: i64, message: &RenderedMessage) -> Self {
        let rows = message.menu.rows();
        let reply_markup = (!rows.is_empty()).then(|| ReplyKeyboardMarkup {
            keyboard: rows
                .into_iter()
                .map(|row| row.into_iter().map(|text| KeyboardButton { text }).collect())
                .collect(),
            resize_keyboard: true,
        });
        SendMessageRequest {
            chat_id,
            text: message.text.clone(),
            reply_markup,
        }
    }
}

#[derive(Clone)]
pub struct TelegramBot {
    client: Client,
    base_url: String,
}

impl TelegramBot {
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        // long polling keeps the request open for POLL_TIMEOUT_SECS
        let client = Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()?;
        Ok(TelegramBot {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    pub fn from_env() -> Result<Self> {
        let token = get_env_variable("TELEGRAM_BOT_TOKEN")
            .ok_or_else(|| anyhow!("TELEGRAM_BOT_TOKEN is not set"))?;
        let api_url =
            get_env_variable("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::new(&api_url, &token)
    }

    async fn call<T: DeserializeOwned, B: Serialize>(&self, method: &str, body: &B) -> Result<T> {
        let res = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await
            // the bot token is part of the URL
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Couldn't call Telegram method {}", method))?;

        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        let response = serde_json::from_str::<TelegramResponse<T>>(&body).with_context(|| {
            format!("Telegram API returned {} with unexpected body: {}", status, body)
        })?;

        match response {
            TelegramResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            TelegramResponse { description, .. } => Err(anyhow!(
                "Telegram API returned {} for {}: {}",
                status,
                method,
                description.unwrap_or_default()
            )),
        }
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, message: &RenderedMessage) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", &SendMessageRequest::new(chat_id, message))
            .await?;
        Ok(())
    }

    /// Polls for messages until the process stops. Each message becomes its own
    /// task; the conversation service keeps turns of one chat in order.
    pub async fn run(self, service: Arc<ConversationService>) -> Result<()> {
        info!("Telegram bot is polling for messages");
        let mut offset = 0;
        loop {
            let updates = match self.get_updates(offset, POLL_TIMEOUT_SECS).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("Polling Telegram failed, retrying in {:?}: {:#}", RETRY_DELAY, e);
                    sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(Message {
                    chat,
                    text: Some(text),
                }) = update.message
                else {
                    debug!("Skipping update {} without text", update.update_id);
                    continue;
                };

                let bot = self.clone();
                let service = service.clone();
                tokio::spawn(async move {
                    bot.answer(&service, chat.id, &text).await;
                });
            }
        }
    }

    async fn answer(&self, service: &ConversationService, chat_id: i64, text: &str) {
        let Some(reply) = service.handle(UserId(chat_id), text).await else {
            return;
        };
        if let Err(e) = self.send_message(chat_id, &reply).await {
            error!("Couldn't answer chat {}: {:#}", chat_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        conversation::{InMemoryStore, Menu},
        market_data::stub::ScriptedRates,
    };
    use serde_json::Value;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    async fn received_bodies(server: &MockServer, method_path: &str) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == method_path)
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn send_message_attaches_the_menu_as_keyboard() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true, "result": {"message_id": 1}})),
            )
            .mount(&server)
            .await;

        let bot = TelegramBot::new(&server.uri(), "TOKEN").unwrap();
        let message = RenderedMessage {
            text: "Please choose the base currency:".to_string(),
            menu: Menu::ChangeOnly,
        };
        bot.send_message(42, &message).await.unwrap();

        let bodies = received_bodies(&server, "/botTOKEN/sendMessage").await;
        assert_eq!(
            bodies,
            vec![json!({
                "chat_id": 42,
                "text": "Please choose the base currency:",
                "reply_markup": {
                    "keyboard": [[{"text": "🔄 Change Currency Pair"}]],
                    "resize_keyboard": true
                }
            })]
        );
    }

    #[test]
    fn menu_less_messages_keep_the_previous_keyboard() {
        let request = SendMessageRequest::new(
            7,
            &RenderedMessage {
                text: "help".to_string(),
                menu: Menu::None,
            },
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"chat_id": 7, "text": "help"})
        );
    }

    #[tokio::test]
    async fn connection_errors_do_not_reveal_the_token() {
        let bot = TelegramBot::new("http://127.0.0.1:9", "123:SECRET-BOT-TOKEN").unwrap();
        let error = bot.get_updates(0, 0).await.unwrap_err();
        let logged = format!("{:#}", error);
        assert!(logged.contains("getUpdates"), "{}", logged);
        assert!(!logged.contains("SECRET-BOT-TOKEN"), "{}", logged);
        assert!(!format!("{:?}", error).contains("SECRET-BOT-TOKEN"));
    }

    #[tokio::test]
    async fn api_errors_are_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "ok": false,
                "error_code": 401,
                "description": "Unauthorized"
            })))
            .mount(&server)
            .await;

        let bot = TelegramBot::new(&server.uri(), "BAD").unwrap();
        let error = bot.get_updates(0, 0).await.unwrap_err();
        assert!(error.to_string().contains("Unauthorized"), "{}", error);
    }

    #[tokio::test]
    async fn updates_are_parsed_and_answered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [
                    {"update_id": 10, "message": {"message_id": 1, "chat": {"id": 5, "type": "private"}, "text": "/start"}},
                    {"update_id": 11, "message": {"message_id": 2, "chat": {"id": 5, "type": "private"}, "sticker": {}}},
                    {"update_id": 12}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true, "result": {"message_id": 3}})),
            )
            .mount(&server)
            .await;

        let bot = TelegramBot::new(&server.uri(), "TOKEN").unwrap();
        let updates = bot.get_updates(0, 0).await.unwrap();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].update_id, 10);
        assert_eq!(updates[0].message.as_ref().unwrap().chat.id, 5);
        assert!(updates[1].message.as_ref().unwrap().text.is_none());
        assert!(updates[2].message.is_none());

        let service = ConversationService::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(ScriptedRates::failing()),
        );
        bot.answer(&service, 5, "/start").await;

        let bodies = received_bodies(&server, "/botTOKEN/sendMessage").await;
        assert_eq!(bodies.len(), 1);
        assert_eq!(
            bodies[0]["text"],
            "Welcome to Currency Converter Bot! Please choose the base currency:"
        );
        assert_eq!(bodies[0]["reply_markup"]["keyboard"][0][0]["text"], "🇺🇦 UAH");
    }
}

use serde::Serialize;

use super::{
    machine::{ConversionResult, Prompt, CONFIRM_LABEL, RESET_LABEL},
    state::CurrencyPair,
};
use crate::services::{currencies::Currency, shared::round_to_decimals};

const CURRENCY_MENU_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Menu {
    Currencies,
    ConfirmOrChange,
    ChangeOnly,
    None,
}

impl Menu {
    /// Button labels, row by row.
    pub fn rows(&self) -> Vec<Vec<String>> {
        match self {
            Menu::Currencies => Currency::all()
                .chunks(CURRENCY_MENU_WIDTH)
                .map(|row| row.iter().map(|currency| currency.decorate()).collect())
                .collect(),
            Menu::ConfirmOrChange => vec![vec![confirm_button(), change_button()]],
            Menu::ChangeOnly => vec![vec![change_button()]],
            Menu::None => vec![],
        }
    }
}

fn confirm_button() -> String {
    format!("✅ {}", CONFIRM_LABEL)
}

fn change_button() -> String {
    format!("🔄 {}", RESET_LABEL)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub text: String,
    pub menu: Menu,
}

impl RenderedMessage {
    fn new(text: impl Into<String>, menu: Menu) -> Self {
        RenderedMessage {
            text: text.into(),
            menu,
        }
    }
}

pub fn render(prompt: &Prompt) -> RenderedMessage {
    match prompt {
        Prompt::Welcome => RenderedMessage::new(
            "Welcome to Currency Converter Bot! Please choose the base currency:",
            Menu::Currencies,
        ),
        Prompt::Help => RenderedMessage::new(help_text(), Menu::None),
        Prompt::ChooseBase => {
            RenderedMessage::new("Please choose the base currency:", Menu::Currencies)
        }
        Prompt::InvalidBase => {
            RenderedMessage::new("Please choose a valid base currency:", Menu::Currencies)
        }
        Prompt::ChooseTarget => {
            RenderedMessage::new("Please choose the target currency:", Menu::Currencies)
        }
        Prompt::InvalidTarget => {
            RenderedMessage::new("Please choose a valid target currency:", Menu::Currencies)
        }
        Prompt::ConfirmPair(pair) => RenderedMessage::new(
            format!(
                "You have selected {}. Confirm or change the pair:",
                describe_pair(pair)
            ),
            Menu::ConfirmOrChange,
        ),
        Prompt::EnterAmount(pair) => RenderedMessage::new(
            format!(
                "Please enter the amount to convert from {}:",
                describe_pair(pair)
            ),
            Menu::ChangeOnly,
        ),
        Prompt::InvalidAmount => {
            RenderedMessage::new("Please enter a valid amount.", Menu::ChangeOnly)
        }
        Prompt::LookupFailed => RenderedMessage::new(
            "Sorry, something went wrong. Please try again later.",
            Menu::ChangeOnly,
        ),
        Prompt::Conversion(result) => {
            RenderedMessage::new(describe_conversion(result), Menu::ChangeOnly)
        }
    }
}

fn describe_pair(pair: &CurrencyPair) -> String {
    format!("{} to {}", pair.base().decorate(), pair.target().decorate())
}

fn describe_conversion(result: &ConversionResult) -> String {
    let base = result.pair.base();
    let target = result.pair.target();
    format!(
        "{} {} is equal to {:.2} {}\nExchange rate: 1 {} = {:.6} {}\nReverse rate: 1 {} = {:.6} {}",
        result.amount.normalize(),
        base,
        round_to_decimals(result.converted_amount, 2),
        target,
        base,
        round_to_decimals(result.rate, 6),
        target,
        target,
        round_to_decimals(result.reverse_rate, 6),
        base,
    )
}

fn help_text() -> String {
    format!(
        "Pick a base currency, then a target currency, confirm the pair and send any amount to convert it.\n\
         Send \"{}\" at any time to start over, or /start to see the welcome message again.",
        RESET_LABEL
    )
}

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::state::{ConversationState, CurrencyPair};
use crate::services::{currencies::Currency, market_data::fx_rates::RateProvider};

pub const START_COMMAND: &str = "/start";
pub const HELP_COMMAND: &str = "/help";
pub const RESET_LABEL: &str = "Change Currency Pair";
pub const CONFIRM_LABEL: &str = "Confirm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub pair: CurrencyPair,
    pub amount: Decimal,
    pub converted_amount: Decimal,
    /// Units of target per 1 base.
    pub rate: Decimal,
    /// Units of base per 1 target.
    pub reverse_rate: Decimal,
}

impl ConversionResult {
    /// `None` when the numbers leave the representable range.
    pub fn compute(pair: CurrencyPair, amount: Decimal, rate: Decimal) -> Option<Self> {
        Some(ConversionResult {
            pair,
            amount,
            converted_amount: amount.checked_mul(rate)?,
            rate,
            reverse_rate: Decimal::ONE.checked_div(rate)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Welcome,
    Help,
    ChooseBase,
    InvalidBase,
    ChooseTarget,
    InvalidTarget,
    ConfirmPair(CurrencyPair),
    EnterAmount(CurrencyPair),
    InvalidAmount,
    LookupFailed,
    Conversion(ConversionResult),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    Keep,
    Set(ConversationState),
    /// Deletes the record rather than resetting it.
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub change: StateChange,
    /// `None` means the bot stays silent.
    pub prompt: Option<Prompt>,
}

impl Transition {
    fn keep(prompt: Prompt) -> Self {
        Transition {
            change: StateChange::Keep,
            prompt: Some(prompt),
        }
    }

    fn set(state: ConversationState, prompt: Prompt) -> Self {
        Transition {
            change: StateChange::Set(state),
            prompt: Some(prompt),
        }
    }

    fn clear(prompt: Prompt) -> Self {
        Transition {
            change: StateChange::Clear,
            prompt: Some(prompt),
        }
    }

    fn silent() -> Self {
        Transition {
            change: StateChange::Keep,
            prompt: None,
        }
    }
}

/// Matches a button label while ignoring emoji or punctuation decorating
/// either end of the message.
pub fn is_labelled(text: &str, label: &str) -> bool {
    text.trim_matches(|c: char| !c.is_alphanumeric() && !c.is_whitespace())
        .trim()
        .eq_ignore_ascii_case(label)
}

/// Slash commands, also in the `/start@SomeBot` form used in group chats.
pub fn is_slash_command(text: &str, command: &str) -> bool {
    text.trim()
        .split('@')
        .next()
        .is_some_and(|head| head == command)
}

pub fn parse_amount(text: &str) -> Option<Decimal> {
    Decimal::from_str(text.trim())
        .ok()
        .filter(|amount| *amount > Decimal::ZERO)
}

/// Interprets one message against the user's current state. The rate lookup
/// is the only side effect and only happens for a valid amount.
pub async fn step(
    state: &ConversationState,
    text: &str,
    rates: &dyn RateProvider,
) -> Transition {
    if is_slash_command(text, START_COMMAND) {
        return Transition::clear(Prompt::Welcome);
    }
    if is_slash_command(text, HELP_COMMAND) {
        return Transition::keep(Prompt::Help);
    }
    if is_labelled(text, RESET_LABEL) {
        return Transition::clear(Prompt::ChooseBase);
    }

    match *state {
        ConversationState::AwaitingBase => match Currency::find_in(text) {
            Some(base) => Transition::set(
                ConversationState::AwaitingTarget { base },
                Prompt::ChooseTarget,
            ),
            None => Transition::keep(Prompt::InvalidBase),
        },
        ConversationState::AwaitingTarget { base } => {
            match Currency::find_in(text).and_then(|target| CurrencyPair::new(base, target)) {
                Some(pair) => Transition::set(
                    ConversationState::AwaitingConfirmation(pair),
                    Prompt::ConfirmPair(pair),
                ),
                None => Transition::keep(Prompt::InvalidTarget),
            }
        }
        ConversationState::AwaitingConfirmation(pair) => {
            if is_labelled(text, CONFIRM_LABEL) {
                Transition::set(
                    ConversationState::AwaitingAmount(pair),
                    Prompt::EnterAmount(pair),
                )
            } else {
                debug!("Ignoring unrecognized text while awaiting confirmation");
                Transition::silent()
            }
        }
        ConversationState::AwaitingAmount(pair) => convert(pair, text, rates).await,
    }
}

async fn convert(pair: CurrencyPair, text: &str, rates: &dyn RateProvider) -> Transition {
    let Some(amount) = parse_amount(text) else {
        return Transition::keep(Prompt::InvalidAmount);
    };

    let rate = match rates
        .fetch_rates(pair.base())
        .await
        .and_then(|table| table.rate_for(pair.target()))
    {
        Ok(rate) => rate,
        Err(e) => {
            warn!(
                "Rate lookup for {} -> {} failed: {}",
                pair.base(),
                pair.target(),
                e
            );
            return Transition::keep(Prompt::LookupFailed);
        }
    };

    match ConversionResult::compute(pair, amount, rate) {
        Some(result) => Transition::keep(Prompt::Conversion(result)),
        None => Transition::keep(Prompt::InvalidAmount),
    }
}

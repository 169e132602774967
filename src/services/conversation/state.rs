use std::fmt;

use serde::{Deserialize, Serialize};

use crate::services::currencies::Currency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base and target of a conversion. Both sides always differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyPair {
    base: Currency,
    target: Currency,
}

impl CurrencyPair {
    pub fn new(base: Currency, target: Currency) -> Option<Self> {
        (base != target).then_some(CurrencyPair { base, target })
    }

    pub fn base(&self) -> Currency {
        self.base
    }

    pub fn target(&self) -> Currency {
        self.target
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingBase,
    AwaitingTarget,
    AwaitingConfirmation,
    AwaitingAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    AwaitingBase,
    AwaitingTarget {
        base: Currency,
    },
    AwaitingConfirmation(CurrencyPair),
    AwaitingAmount(CurrencyPair),
}

impl ConversationState {
    pub fn phase(&self) -> Phase {
        match self {
            ConversationState::AwaitingBase => Phase::AwaitingBase,
            ConversationState::AwaitingTarget { .. } => Phase::AwaitingTarget,
            ConversationState::AwaitingConfirmation(_) => Phase::AwaitingConfirmation,
            ConversationState::AwaitingAmount(_) => Phase::AwaitingAmount,
        }
    }

    pub fn base_currency(&self) -> Option<Currency> {
        match self {
            ConversationState::AwaitingBase => None,
            ConversationState::AwaitingTarget { base } => Some(*base),
            ConversationState::AwaitingConfirmation(pair)
            | ConversationState::AwaitingAmount(pair) => Some(pair.base()),
        }
    }

    pub fn target_currency(&self) -> Option<Currency> {
        match self {
            ConversationState::AwaitingConfirmation(pair)
            | ConversationState::AwaitingAmount(pair) => Some(pair.target()),
            _ => None,
        }
    }
}

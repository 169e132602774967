use std::{fmt, str::FromStr};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    UAH,
    USD,
    EUR,
    GBP,
    CHF,
    PLN,
}

/// Canonical menu order.
pub const CURRENCIES: [Currency; 6] = [
    Currency::UAH,
    Currency::USD,
    Currency::EUR,
    Currency::GBP,
    Currency::CHF,
    Currency::PLN,
];

impl Currency {
    pub fn all() -> &'static [Currency] {
        &CURRENCIES
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::UAH => "UAH",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::CHF => "CHF",
            Currency::PLN => "PLN",
        }
    }

    pub fn flag(&self) -> &'static str {
        match self {
            Currency::UAH => "🇺🇦",
            Currency::USD => "🇺🇸",
            Currency::EUR => "🇪🇺",
            Currency::GBP => "🇬🇧",
            Currency::CHF => "🇨🇭",
            Currency::PLN => "🇵🇱",
        }
    }

    /// Menu label, e.g. `🇺🇦 UAH`.
    pub fn decorate(&self) -> String {
        format!("{} {}", self.flag(), self.code())
    }

    /// Finds the first currency (in menu order) whose code occurs anywhere in
    /// `text`. Menu buttons carry a flag around the code, so containment is
    /// used instead of equality.
    pub fn find_in(text: &str) -> Option<Currency> {
        CURRENCIES
            .iter()
            .copied()
            .find(|currency| text.contains(currency.code()))
    }

    /// Exact code lookup, as used in API payloads.
    pub fn from_code(code: &str) -> Option<Currency> {
        CURRENCIES
            .iter()
            .copied()
            .find(|currency| currency.code() == code)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_valid(code: &str) -> bool {
        code.parse::<Currency>().is_ok()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::from_code(&s.trim().to_uppercase()).ok_or_else(|| {
            anyhow!(
                "Unsupported currency '{}', expected one of {}",
                s,
                CURRENCIES.map(|c| c.code()).join(", ")
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn menu_order_is_stable() {
        let codes: Vec<&str> = Currency::all().iter().map(|c| c.code()).collect();
        assert_eq!(codes, vec!["UAH", "USD", "EUR", "GBP", "CHF", "PLN"]);
        assert_eq!(Currency::all(), Currency::all());
    }

    #[test]
    fn decorated_labels_match_their_currency() {
        assert_eq!(Currency::UAH.decorate(), "🇺🇦 UAH");
        for currency in Currency::all() {
            assert_eq!(Currency::find_in(&currency.decorate()), Some(*currency));
        }
    }

    #[test]
    fn plain_codes_and_garbage() {
        assert_eq!(Currency::find_in("USD"), Some(Currency::USD));
        assert_eq!(Currency::find_in("Invalid Currency"), None);
        assert_eq!(Currency::find_in(""), None);
        // matching is case-sensitive
        assert_eq!(Currency::find_in("usd"), None);
    }

    #[test]
    fn first_code_in_menu_order_wins() {
        assert_eq!(Currency::find_in("PLN or EUR"), Some(Currency::EUR));
    }

    #[test]
    fn validity_check_is_strict() {
        assert!(Currency::is_valid("GBP"));
        assert!(Currency::is_valid(" chf "));
        assert!(!Currency::is_valid("🇬🇧 GBP"));
        assert!(!Currency::is_valid("JPY"));
        assert!("JPY".parse::<Currency>().is_err());
        assert_eq!(Currency::from_code("PLN"), Some(Currency::PLN));
        assert_eq!(Currency::from_code("pln"), None);
    }

    proptest! {
        #[test]
        fn decoration_around_code_is_tolerated(
            prefix in "[a-z🇺🇦🇸 ]{0,6}",
            suffix in "[a-z ✅🔄]{0,6}",
            index in 0usize..6,
        ) {
            let currency = CURRENCIES[index];
            let text = format!("{}{}{}", prefix, currency.code(), suffix);
            prop_assert_eq!(Currency::find_in(&text), Some(currency));
        }
    }
}

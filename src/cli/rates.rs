use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use spinners_rs::{Spinner, Spinners};
use tabled::{Table, Tabled};

use crate::services::{
    currencies::Currency,
    market_data::fx_rates::{RateProvider, RateTable},
    shared::round_to_decimals,
};

#[derive(Debug, Tabled)]
struct StringifiedRate {
    currency: String,
    rate: String,
    reverse_rate: String,
}

fn stringify_rates(table: &RateTable) -> Vec<StringifiedRate> {
    Currency::all()
        .iter()
        .filter(|currency| **currency != table.base)
        .map(|currency| match table.rate_for(*currency) {
            Ok(rate) => StringifiedRate {
                currency: currency.decorate(),
                rate: format!("{:.6}", round_to_decimals(rate, 6)),
                reverse_rate: Decimal::ONE
                    .checked_div(rate)
                    .map(|reverse| format!("{:.6}", round_to_decimals(reverse, 6)))
                    .unwrap_or_else(|| "-".to_string()),
            },
            Err(_) => StringifiedRate {
                currency: currency.decorate(),
                rate: "-".to_string(),
                reverse_rate: "-".to_string(),
            },
        })
        .collect()
}

pub async fn rates(base: Currency, provider: &dyn RateProvider) -> anyhow::Result<()> {
    let mut sp = Spinner::new(Spinners::Point, "Fetching exchange rates...");
    sp.start();
    let table = provider.fetch_rates(base).await;
    sp.stop();
    let table = table?;

    println!("\nExchange rates for 1 {}:", base.decorate().bold());
    println!("{}", Table::new(stringify_rates(&table)));
    if let Some(updated_at) = table.updated_at {
        println!("{}", format!("Last updated {}", updated_at.format("%Y-%m-%d %H:%M UTC")).dimmed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn every_other_currency_gets_a_row() {
        let table = RateTable {
            base: Currency::UAH,
            rates: [(Currency::USD, dec!(0.027)), (Currency::EUR, dec!(0.025))]
                .into_iter()
                .collect(),
            updated_at: None,
        };
        let rows = stringify_rates(&table);

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].currency, "🇺🇸 USD");
        assert_eq!(rows[0].rate, "0.027000");
        assert_eq!(rows[0].reverse_rate, "37.037037");
        assert_eq!(rows[1].reverse_rate, "40.000000");
        assert_eq!(rows[4].currency, "🇵🇱 PLN");
        assert_eq!(rows[4].rate, "-");
    }
}

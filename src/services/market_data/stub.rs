use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::fx_rates::{LookupFailure, RateProvider, RateTable};
use crate::services::currencies::Currency;

/// Replays scripted lookup outcomes; `None` entries fail, an exhausted script
/// repeats its last entry.
pub struct ScriptedRates {
    script: Mutex<VecDeque<Option<Vec<(Currency, Decimal)>>>>,
    last: Mutex<Option<Vec<(Currency, Decimal)>>>,
    pub calls: AtomicUsize,
}

impl ScriptedRates {
    pub fn new(script: Vec<Option<Vec<(Currency, Decimal)>>>) -> Self {
        ScriptedRates {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(rates: Vec<(Currency, Decimal)>) -> Self {
        Self::new(vec![Some(rates)])
    }

    pub fn failing() -> Self {
        Self::new(vec![None])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateProvider for ScriptedRates {
    async fn fetch_rates(&self, base: Currency) -> Result<RateTable, LookupFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut script = self.script.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            if let Some(entry) = script.pop_front() {
                *last = entry;
            }
            last.clone()
        };
        match next {
            Some(rates) => Ok(RateTable {
                base,
                rates: rates.into_iter().collect::<HashMap<_, _>>(),
                updated_at: None,
            }),
            None => Err(LookupFailure::Api("scripted failure".to_string())),
        }
    }
}

pub mod fx_rates;

#[cfg(test)]
pub mod stub;

pub mod conversation;
pub mod currencies;
pub mod market_data;
pub mod shared;
pub mod telegram;

pub mod auth;
pub mod bidding;
pub mod config;
pub mod checkout;
pub mod dashboard;
pub mod error;
pub mod listing;
pub mod pricing;
pub mod router;
pub mod store;

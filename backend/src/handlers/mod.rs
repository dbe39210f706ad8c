pub mod admin;
pub mod availability;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod promos;
pub mod webhooks;

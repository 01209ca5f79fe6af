pub mod bootstrap;
pub mod compatibility;
pub mod engine;
pub mod ledger;
pub mod platform;
pub mod projection;

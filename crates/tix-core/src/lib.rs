pub mod cache;
pub mod config;
pub mod error;
pub mod io;
pub mod ledger;
pub mod paths;
pub mod provider;
pub mod status;
pub mod store;
pub mod ticket;
pub mod work;
pub mod workspace;

pub use error::{Result, TixError};

pub mod fetch_handler;
pub mod router;
pub mod strategies;

pub use fetch_handler::FetchHandler;
pub use router::{RequestRouter, Route};
pub use strategies::StrategyExecutor;

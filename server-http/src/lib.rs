pub mod handlers;
pub mod models;
pub mod monitor;
pub mod routes;
pub mod state;
pub mod upstream;

// Re-export key types
pub use routes::build_router;
pub use state::AppState;
pub use upstream::HttpFetcher;

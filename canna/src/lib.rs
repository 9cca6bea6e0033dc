//! Offline-first caching layer for the Canna Bomb storefront.
//!
//! Requests are classified into API, static asset and page routes and served
//! with per-route cache strategies over versioned cache generations. Install
//! precaches the app shell; activate retires stale generations. Queued cart and
//! order mutations are replayed on reconnect, and push payloads become
//! notifications.

pub mod domain;
pub mod events;
pub mod persistence;
pub mod planes;
pub mod ports;
pub mod push;
pub mod sync;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use worker::OfflineWorker;

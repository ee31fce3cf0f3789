//! GateGuard platform glue
//!
//! This crate hosts everything the admission engine treats as external:
//! the SQLite storage backend, the HTTP client for proxy-detection
//! services, the static geolocation table, the admin command surface and
//! the binary wiring them together.

// Configuration file loading
pub mod config;
pub use config::ProxySettings;

// SQLite storage backend
pub mod sqlite;
pub use sqlite::SqliteBackend;

// HTTP fetcher for proxy-detection services
pub mod http;
pub use http::ReqwestFetcher;

// Static CIDR-table geolocation
pub mod geo;
pub use geo::StaticGeoResolver;

// Admin command surface
pub mod commands;
pub use commands::CommandHandler;

//! HTTP surface of the skill registry.
//!
//! Every request is stateless: handlers read the version index and the skill
//! tree through the injected [`server::AppState`], optionally run the zip codec,
//! and answer with JSON or a zip stream.
//!
//! Not-found and validation outcomes are reported inside HTTP 200 payloads
//! (`{"error": ...}`, `{"status": false, ...}`); only unexpected failures use a
//! 5xx status. Clients depend on this, so it is kept as-is.

pub mod download_routes;
pub mod error;
pub mod responses;
pub mod server;
pub mod skill_routes;
pub mod upload_routes;

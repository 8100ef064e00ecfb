//! # Hopscotch
//!
//! Session engine for hopscotch search: an exploratory, feedback-driven
//! interface where a user issues a query, inspects three results, and marks
//! one "similar" or "different" to drive the next step. Ranking and
//! refinement are delegated to a remote search backend over HTTP; this crate
//! owns the client-side state machine around it.
//!
//! ## Architecture
//!
//! ```text
//! User action → Navigator → SessionStore → HttpGateway (HTTP)
//!                                ↓
//!                          SessionState (boxes, pointer, reference points)
//!                                ↓
//!                          SummaryView (read-only replay)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hopscotch::{Config, HttpGateway, Navigator, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let gateway = HttpGateway::new(&config.gateway, config.request.clone())?;
//!     let store = Arc::new(SessionStore::new(Arc::new(gateway)));
//!     let navigator = Navigator::new(Arc::clone(&store));
//!     navigator.submit_query("retro sneakers", 1).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Search backend gateway contract and HTTP client.
pub mod gateway;
/// Box navigation and scroll synchronization.
pub mod navigation;
/// Session state store for the exploration trail.
pub mod session;
/// Read-only session replay projection.
pub mod summary;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use gateway::{Feedback, HttpGateway, SearchGateway, SearchResult};
pub use navigation::{Navigator, ScrollTo, Viewport};
pub use session::{Hop, HopId, HopKind, ReferencePoint, SessionState, SessionStore};
pub use summary::SummaryView;

//! lexportal: client core for a legal-services portal.
//!
//! Citizens and lawyers reach role-gated dashboards backed by a REST backend,
//! a local record cache and an assistant chat. This crate holds everything
//! below the presentation layer:
//!
//! - [`session`]: stored session tokens and the per-page role check
//! - [`gateway`]: bearer-authenticated JSON client for `/api/v1`
//! - [`store`]: injectable key-value storage and typed record collections
//! - [`records`]: cases, reports, reminders, disputes, documents, chat messages
//! - [`assistant`]: the chat state machine over a completion provider
//! - [`portal`]: page mount flow tying the above together

pub mod assistant;
pub mod config;
pub mod error;
pub mod gateway;
pub mod portal;
pub mod records;
pub mod session;
pub mod settings;
pub mod store;

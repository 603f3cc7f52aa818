//! SQLite persistence for the outbound share request queue.
//!
//! This crate provides:
//! - `AsyncDatabase`: async executor running every query on one dedicated thread
//! - Schema migrations for the `share_mq` table
//! - Model types (`ShareRequest`, `NewShareRequest`, `Protocol`)
//! - Standalone query functions in [`queries`]
//!
//! ```ignore
//! let db = AsyncDatabase::open(path).await?;
//! let due = db.call(|conn| queries::select_due_share_requests(conn, 2)).await?;
//! ```
//!
//! Only SQL belongs inside `db.call()`. Payload decoding and network calls
//! happen outside of it.

mod error;
mod executor;
mod migrations;
mod models;
pub mod queries;

pub use error::{DatabaseError, DatabaseResult};
pub use executor::AsyncDatabase;
pub use migrations::{run_migrations, CURRENT_VERSION};
pub use models::{NewShareRequest, Protocol, ShareRequest};

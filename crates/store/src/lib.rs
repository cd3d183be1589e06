//! # Store
//!
//! Durable store-and-forward buffer backed by an embedded SQLite file.
//!
//! One file per vehicle, one table:
//!
//! ```sql
//! CREATE TABLE offline_buffer (
//!     id        INTEGER PRIMARY KEY AUTOINCREMENT,
//!     timestamp INTEGER NOT NULL,
//!     payload   BLOB    NOT NULL
//! );
//! ```
//!
//! `AUTOINCREMENT` keeps ids strictly increasing even after the newest row is
//! deleted, which the drain order relies on.

mod sqlite;

pub use contracts::{BufferError, BufferRow, FrameStore};
pub use sqlite::SqliteBuffer;

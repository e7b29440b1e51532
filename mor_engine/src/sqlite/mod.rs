//! SQLite backend for the MOR engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;

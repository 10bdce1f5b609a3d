//! Core library for the task list
//!
//! This crate contains the persistence and state logic, including:
//! - The task model, seed data and list queries
//! - The host database bridge contract and a SQLite implementation
//! - The fallback blob store
//! - The persistence adapter with its one-way fallback
//! - The task store state controller

pub mod adapter;
pub mod blob;
pub mod bridge;
pub mod error;
pub mod store;
pub mod task;

pub use error::{Error, Operation};
pub type Result<T> = std::result::Result<T, Error>;

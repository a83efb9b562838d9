//! Core types and trait definitions for the MeetTrip travel-companion
//! service.
//!
//! This crate is free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod account;
pub mod discovery;
pub mod error;
pub mod matching;
pub mod message;
pub mod profile;
pub mod store;
pub mod tags;
pub mod trip;
pub mod vocabulary;

pub use error::{Error, Result};

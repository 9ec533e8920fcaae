//! Core types and trait definitions for the petdir listing-claim service.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! claim workflow is written against the [`store::DirectoryStore`] trait and
//! the [`workflow::CodeNotifier`] seam; storage and transport live elsewhere.

// Native `async fn` in traits; the `Send` bounds are spelled out on the
// returned futures in `store`.
#![allow(async_fn_in_trait)]

pub mod claim;
pub mod directory;
pub mod error;
pub mod messages;
pub mod store;
pub mod workflow;

pub use error::{Error, Result};

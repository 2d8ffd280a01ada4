//! Bravex Core - Shared types library.
//!
//! This crate provides common types used across the Bravex storefront
//! components. It contains only types - no I/O, no HTTP clients - which
//! keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe entity IDs and paging metadata

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

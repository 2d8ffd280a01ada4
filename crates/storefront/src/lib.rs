//! Bravex Storefront core library.
//!
//! Owns the client-side state of the storefront: the locally persisted
//! shopping cart, the catalog and blog pagination state machines, and
//! the checkout handoff to an external payment backend.
//!
//! # Architecture
//!
//! - [`api`] - typed client for the catalog and payment backends
//! - [`cart`] - cart store with pluggable persistence and change broadcast
//! - [`catalog`] - paged, filterable product query state machine
//! - [`blog`] - the same machine for posts, with a featured slot
//! - [`checkout`] - order payload assembly and pending-order handoff
//!
//! Rendering, templating and UI wiring live outside this crate: the
//! controllers call into [`catalog::CatalogView`] / [`blog::FeedView`]
//! implementations supplied by the embedding layer, and cart listeners
//! subscribe to snapshot broadcasts.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod blog;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;

pub use error::{Result, StoreError};

//! Pressmark Core - Domain types and storefront logic.
//!
//! This crate provides the types and pure logic shared by the Pressmark
//! components:
//! - `storefront` - Public-facing print shop
//! - `integration-tests` - End-to-end tests against a fake backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Everything that talks to Supabase or the
//! visitor's session lives in the storefront crate.
//!
//! # Modules
//!
//! - [`types`] - Ids, prices, categories, products and cart lines
//! - [`listing`] - Filter, sort and paginate a fetched product set
//! - [`pagination`] - Collapsed page-number links
//! - [`carousel`] - Circular fixed-window featured carousel
//! - [`selection`] - Product detail selection with stock guard

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod carousel;
pub mod listing;
pub mod pagination;
pub mod selection;
pub mod types;

pub use types::*;

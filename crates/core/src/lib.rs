//! Boutique Core - Shared types library.
//!
//! This crate provides the domain types used across all Boutique components:
//! - `storefront` - Public-facing shop (catalog, cart, checkout, payment, refunds)
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, slugs, emails, reference codes
//!   and the small enums that describe catalog items, addresses and orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

//! Core types for Boutique.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod discount;
pub mod email;
pub mod id;
pub mod price;
pub mod reference;
pub mod slug;
pub mod status;

pub use discount::{Discount, DiscountError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use reference::{ReferenceCode, ReferenceCodeError};
pub use slug::{Slug, SlugError};
pub use status::*;

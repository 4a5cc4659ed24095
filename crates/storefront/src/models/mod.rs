//! Domain models for the storefront.
//!
//! These are validated domain types, separate from the database row types in
//! [`crate::db`].

pub mod address;
pub mod catalog;
pub mod coupon;
pub mod order;
pub mod payment;
pub mod refund;
pub mod session;

pub use address::{Address, AddressFields, NewAddress};
pub use catalog::{Item, NewItem};
pub use coupon::Coupon;
pub use order::{Order, OrderItem};
pub use payment::{NewPayment, Payment};
pub use refund::{NewRefund, Refund};
pub use session::{CurrentUser, keys as session_keys};

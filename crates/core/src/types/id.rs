//! Newtype IDs for type-safe entity references.
//!
//! Every table in the shop uses a `BIGINT` identity primary key. Wrapping those
//! keys in distinct types stops an `OrderItemId` from being passed where an
//! `OrderId` is expected.

/// Define a type-safe wrapper around an `i64` primary key.
///
/// The generated type is `Copy`, serializes transparently, converts to and
/// from `i64`, and (with the `postgres` feature) binds directly in sqlx
/// queries as `BIGINT`.
///
/// # Example
///
/// ```rust
/// # use boutique_core::define_id;
/// define_id!(WishlistId);
///
/// let id = WishlistId::new(7);
/// assert_eq!(id.as_i64(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw primary key value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the raw primary key value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i64 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i64 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i64 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i64 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// Users are owned by the external identity provider; only their ID is stored.
define_id!(UserId);
define_id!(ItemId);
define_id!(OrderItemId);
define_id!(OrderId);
define_id!(AddressId);
define_id!(CouponId);
define_id!(PaymentId);
define_id!(RefundId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_i64() {
        let id = OrderId::from(42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(id, OrderId::new(42));
    }

    #[test]
    fn test_display_is_raw_value() {
        assert_eq!(ItemId::new(5).to_string(), "5");
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        assert!(AddressId::new(1) < AddressId::new(2));
    }
}

//! Newtype IDs for type-safe record references.
//!
//! Every table uses a store-generated UUID primary key. Use the `define_id!`
//! macro to create wrappers that prevent accidentally mixing IDs from
//! different tables.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around [`uuid::Uuid`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_uuid()`, `parse()`
/// - `From<Uuid>`, `Into<Uuid>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use funda_core::define_id;
/// define_id!(ReviewId);
/// define_id!(CouponId);
///
/// let id = uuid::Uuid::new_v4();
/// let review_id = ReviewId::new(id);
/// let coupon_id = CouponId::new(id);
///
/// // These are different types, so this won't compile:
/// // let _: ReviewId = coupon_id;
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
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }

            /// Parse an ID from its hyphenated string form.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is not a valid UUID.
            pub fn parse(s: &str) -> ::core::result::Result<Self, ::uuid::Error> {
                ::uuid::Uuid::parse_str(s).map(Self)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard record IDs
define_id!(CaseId);
define_id!(MailId);
define_id!(UserId);
define_id!(TrackingId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let raw = "6f1c2a9e-3b1d-4c55-9a51-0b0f5c3d2e11";
        let id = CaseId::parse(raw).unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(UserId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let id = MailId::new(uuid::Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}

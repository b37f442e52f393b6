//! Prefixed, time-ordered resource identifiers.

use uuid::Uuid;

pub const PRODUCT_PREFIX: &str = "prod_";

/// `<prefix><32 hex chars>` from a UUIDv7, so ids sort by creation time and are URL-safe.
/// Example: `prod_018f2b6c5e7a7c3d9b1e2f3a4b5c6d7e`
pub fn generate_with_prefix(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::now_v7().simple())
}

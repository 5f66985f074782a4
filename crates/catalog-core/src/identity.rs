//! Deterministic document identity.

use md5::{Digest, Md5};

/// Separator placed between the key components before hashing.
const KEY_SEPARATOR: char = '_';

/// Derive the `_id` of a table document from its logical coordinates.
///
/// The id is the lowercase hex MD5 of `"{source}_{database}_{table}"`, which keeps
/// ids stable across runs, restarts and implementations so that re-publishing
/// replaces documents instead of duplicating them.
pub fn derive_id(source: &str, database: &str, table: &str) -> String {
    let key = format!("{source}{KEY_SEPARATOR}{database}{KEY_SEPARATOR}{table}");
    let mut hasher = Md5::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_id_is_deterministic() {
        let a = derive_id("mysql", "shop", "users");
        let b = derive_id("mysql", "shop", "users");
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_id_known_value() {
        // md5("mysql_shop_users")
        let id = derive_id("mysql", "shop", "users");
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let mut hasher = Md5::new();
        hasher.update(b"mysql_shop_users");
        assert_eq!(id, hex::encode(hasher.finalize()));
    }

    #[test]
    fn test_derive_id_differs_per_table() {
        let users = derive_id("mysql", "shop", "users");
        let orders = derive_id("mysql", "shop", "orders");
        assert_ne!(users, orders);
    }

    #[test]
    fn test_derive_id_differs_per_database() {
        assert_ne!(
            derive_id("mysql", "shop", "users"),
            derive_id("mysql", "billing", "users")
        );
    }

    #[test]
    fn test_derive_id_many_tables_unique() {
        let ids: std::collections::HashSet<String> = (0..5000)
            .map(|i| derive_id("mysql", "shop", &format!("table_{i}")))
            .collect();
        assert_eq!(ids.len(), 5000);
    }
}

//! Cache interceptor key tests: the key must be a pure function of
//! (collection, filter) so that equal queries share an entry and different
//! queries never collide.

use petal_api::cache::CacheKey;

#[test]
fn test_same_query_same_key() {
    let filter = serde_json::json!({"category": "lips", "page": 1});
    assert_eq!(
        CacheKey::new("products", &filter),
        CacheKey::new("products", &filter)
    );
}

#[test]
fn test_field_order_does_not_matter() {
    let a = CacheKey::new(
        "products",
        &serde_json::json!({"page": 2, "category": "skin_care", "sort": "price"}),
    );
    let b = CacheKey::new(
        "products",
        &serde_json::json!({"sort": "price", "category": "skin_care", "page": 2}),
    );
    assert_eq!(a, b);
}

#[test]
fn test_nested_filters_are_canonicalized_too() {
    let a = CacheKey::new(
        "products",
        &serde_json::json!({"query": {"limit": 20, "sort": null}}),
    );
    let b = CacheKey::new(
        "products",
        &serde_json::json!({"query": {"sort": null, "limit": 20}}),
    );
    assert_eq!(a, b);
}

#[test]
fn test_distinct_queries_get_distinct_keys() {
    let base = CacheKey::new("products", &serde_json::json!({"category": "lips"}));

    assert_ne!(
        base,
        CacheKey::new("products", &serde_json::json!({"category": "face"}))
    );
    assert_ne!(
        base,
        CacheKey::new("ratings", &serde_json::json!({"category": "lips"}))
    );
    assert_ne!(
        base,
        CacheKey::new("products", &serde_json::json!({"category": "lips", "page": 2}))
    );
}

#[test]
fn test_array_order_is_preserved() {
    // Arrays are ordered data; [1,2] and [2,1] are different filters.
    let a = CacheKey::new("products", &serde_json::json!({"ids": [1, 2]}));
    let b = CacheKey::new("products", &serde_json::json!({"ids": [2, 1]}));
    assert_ne!(a, b);
}

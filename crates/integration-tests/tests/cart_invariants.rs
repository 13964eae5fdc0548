//! Cart total invariants at the model level: the serialized cart a client
//! sees must always satisfy `total_price == sum(quantity * price)`.

use chrono::Utc;
use rust_decimal::Decimal;

use petal_api::models::{Cart, CartItem};
use petal_core::{CartId, ProductId, UserId};

fn item(price_cents: i64, quantity: i32) -> CartItem {
    CartItem {
        product_id: ProductId::generate(),
        quantity,
        name: "Sample".to_string(),
        price: Decimal::new(price_cents, 2),
        image: "sample.jpeg".to_string(),
    }
}

fn cart_with(items: Vec<CartItem>) -> Cart {
    let total_price = items.iter().map(CartItem::line_total).sum();
    let now = Utc::now();
    Cart {
        id: CartId::generate(),
        user_id: UserId::generate(),
        items,
        total_price,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_total_is_sum_of_line_totals() {
    // $12.50 x 3 + $8.99 x 1 = $46.49
    let cart = cart_with(vec![item(1250, 3), item(899, 1)]);
    assert_eq!(cart.total_price, Decimal::new(4649, 2));
}

#[test]
fn test_empty_cart_total_is_zero() {
    let cart = cart_with(vec![]);
    assert_eq!(cart.total_price, Decimal::ZERO);
}

#[test]
fn test_line_total_scales_with_quantity() {
    let one = item(1999, 1);
    let five = item(1999, 5);
    assert_eq!(one.line_total() * Decimal::from(5), five.line_total());
}

#[test]
fn test_decimal_totals_do_not_drift() {
    // 10 cents x 3, summed many times, must stay exact - the reason money
    // is Decimal and not a float.
    let mut total = Decimal::ZERO;
    for _ in 0..100 {
        total += item(10, 3).line_total();
    }
    assert_eq!(total, Decimal::new(3000, 2));
}

#[test]
fn test_cart_serializes_with_items_and_total() {
    let cart = cart_with(vec![item(1250, 2)]);
    let json = serde_json::to_value(&cart).expect("cart serializes");

    assert_eq!(json["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["total_price"], serde_json::json!("25.00"));
}

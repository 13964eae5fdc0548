//! Order lifecycle tests: the status state machine and the checkout
//! workflow's pure invariants, exercised without a database.

use petal_core::{OrderStatus, PaymentMethod};

// =============================================================================
// State machine
// =============================================================================

#[test]
fn test_full_happy_path() {
    let path = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Returned,
    ];

    for pair in path.windows(2) {
        let [from, to] = pair else { unreachable!() };
        assert!(
            from.can_transition_to(*to),
            "{from} should transition to {to}"
        );
    }
}

#[test]
fn test_cancellation_is_pending_only() {
    assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));

    for status in [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Returned,
        OrderStatus::Cancelled,
    ] {
        assert!(
            !status.can_transition_to(OrderStatus::Cancelled),
            "cancelling a {status} order must be rejected"
        );
        assert!(!status.is_cancellable());
    }
}

#[test]
fn test_terminal_states_accept_nothing() {
    for terminal in [OrderStatus::Cancelled, OrderStatus::Returned] {
        for next in OrderStatus::ALL {
            assert!(
                !terminal.can_transition_to(next),
                "{terminal} must not transition to {next}"
            );
        }
    }
}

#[test]
fn test_states_cannot_be_skipped_or_reversed() {
    // Skips
    assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
    assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
    assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Delivered));
    assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Returned));

    // Reversals
    assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Pending));
    assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
    assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Shipped));
}

#[test]
fn test_no_self_transitions() {
    for status in OrderStatus::ALL {
        assert!(!status.can_transition_to(status));
    }
}

// =============================================================================
// Checkout request shapes
// =============================================================================

#[test]
fn test_payment_method_wire_format() {
    // The payment method set is closed; anything else must fail to parse.
    let cod: PaymentMethod = serde_json::from_str("\"cash_on_delivery\"").expect("valid method");
    assert_eq!(cod, PaymentMethod::CashOnDelivery);

    let card: PaymentMethod = serde_json::from_str("\"card\"").expect("valid method");
    assert_eq!(card, PaymentMethod::Card);

    assert!(serde_json::from_str::<PaymentMethod>("\"wire_transfer\"").is_err());
}

#[test]
fn test_status_wire_format_round_trips() {
    for status in OrderStatus::ALL {
        let json = serde_json::to_string(&status).expect("serializes");
        let back: OrderStatus = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, status);
    }
}

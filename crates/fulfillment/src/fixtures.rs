use voicecart_core::domain::money::{Money, Price};
use voicecart_core::domain::order::{Cart, LineItem, Merchant};

const CURRENCY: &str = "USD";

fn usd(units: i64, nanos: i32) -> Price {
    Price::actual(Money::new(CURRENCY, units, nanos))
}

/// The demo book store cart offered on every transaction.
pub fn memoir_cart() -> Cart {
    Cart {
        merchant: Merchant { id: "book_store_1".to_owned(), name: "Book Store".to_owned() },
        line_items: vec![
            LineItem::regular("memoirs_1", "My Memoirs", usd(3, 990_000_000))
                .with_note("Note from the author"),
            LineItem::regular("memoirs_2", "Memoirs of a person", usd(5, 990_000_000))
                .with_note("Special introduction by author"),
            LineItem::regular("memoirs_3", "Their memoirs", usd(15, 750_000_000)).with_sub_item(
                LineItem::regular("memoirs_epilogue", "Special memoir epilogue", usd(3, 990_000_000)),
            ),
            LineItem::regular("memoirs_4", "Our memoirs", usd(6, 490_000_000))
                .with_note("Special introduction by author"),
        ],
        notes: Some("The Memoir collection".to_owned()),
        other_items: Vec::new(),
    }
}

/// Flat tax estimate charged on the memoir cart.
pub fn memoir_tax() -> Money {
    Money::new(CURRENCY, 2, 780_000_000)
}

#[cfg(test)]
mod tests {
    use voicecart_core::domain::order::Order;
    use voicecart_core::domain::order_id::{OrderId, OrderIdGenerator, RandomOrderIds};

    use super::{memoir_cart, memoir_tax};

    #[test]
    fn memoir_order_totals_thirty_five_dollars() {
        let order = Order::build(OrderId("fixture".to_owned()), memoir_cart(), memoir_tax(), None)
            .expect("fixture order builds");

        let subtotal = order.subtotal().expect("subtotal line");
        assert_eq!((subtotal.amount.units, subtotal.amount.nanos), (32, 220_000_000));
        assert_eq!((order.total_price.amount.units, order.total_price.amount.nanos), (35, 0));
        assert_eq!(order.cart.line_items.len(), 4);
    }

    #[test]
    fn rebuilding_the_fixture_changes_only_the_id() {
        let ids = RandomOrderIds;
        let build = || {
            Order::build(ids.next_order_id("s-1"), memoir_cart(), memoir_tax(), None)
                .expect("fixture order builds")
        };

        let first = build();
        let second = build();

        assert_ne!(first.id, second.id);
        assert_eq!(first.cart, second.cart);
        assert_eq!(first.other_items, second.other_items);
        assert_eq!(first.total_price, second.total_price);
    }
}

//! A deterministic sample data set for `--demo` runs without PostgreSQL.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use core_types::{CoreError, MenuItemRef, Order, OrderLine, OrderStatus};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

const DAYS: i64 = 14;
const CUSTOMERS: usize = 8;
const ORDER_HOURS: [u32; 9] = [8, 9, 11, 12, 12, 13, 18, 19, 20];

fn menu() -> Vec<(MenuItemRef, Decimal)> {
    let item = |name: &str, category: Option<&str>| MenuItemRef {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category: category.map(str::to_string),
    };
    vec![
        (item("Masala Dosa", Some("Mains")), dec!(6.50)),
        (item("Veg Biryani", Some("Mains")), dec!(8.00)),
        (item("Buddha Bowl", Some("Healthy")), dec!(9.25)),
        (item("Fruit Salad", Some("Healthy")), dec!(4.00)),
        (item("Masala Chai", Some("Drinks")), dec!(1.50)),
        (item("Cold Coffee", Some("Drinks")), dec!(3.00)),
        (item("Samosa", None), dec!(2.00)),
    ]
}

/// Builds a fortnight of orders ending today.
///
/// Past orders are completed, roughly one in nine cancelled. Today's orders are
/// spread over the active statuses so every transition can be tried out.
pub fn seed_orders(now: DateTime<Utc>) -> Result<Vec<Order>, CoreError> {
    let menu = menu();
    let customers: Vec<Uuid> = (0..CUSTOMERS).map(|_| Uuid::new_v4()).collect();
    let today = now.date_naive();

    let mut orders = Vec::new();
    let mut serial = 0usize;
    for days_ago in (0..DAYS).rev() {
        let date = today - Duration::days(days_ago);
        let per_day = 4 + (days_ago as usize % 5);

        for slot in 0..per_day {
            serial += 1;
            let hour = ORDER_HOURS[(serial * 5 + slot) % ORDER_HOURS.len()];
            let minute = ((serial * 17) % 60) as u32;
            let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) else {
                continue;
            };
            let timestamp = date.and_time(time).and_utc();
            if timestamp > now {
                continue;
            }

            let mut lines = Vec::new();
            for offset in 0..(1 + serial % 3) {
                let (item, price) = &menu[(serial * 3 + offset * 2) % menu.len()];
                let quantity = 1 + ((serial + offset) % 2) as u32;
                lines.push(OrderLine::new(Some(item.clone()), quantity, *price)?);
            }

            // A few walk-in orders carry no customer.
            let customer = (serial % 11 != 0).then(|| customers[serial % customers.len()]);
            let mut order = Order::new(customer, timestamp, lines);
            order.status = if days_ago > 0 {
                if serial % 9 == 0 {
                    OrderStatus::Cancelled
                } else {
                    OrderStatus::Completed
                }
            } else {
                match slot % 4 {
                    0 => OrderStatus::Pending,
                    1 => OrderStatus::InPreparation,
                    2 => OrderStatus::Ready,
                    _ => OrderStatus::Completed,
                }
            };
            orders.push(order);
        }
    }

    Ok(orders)
}

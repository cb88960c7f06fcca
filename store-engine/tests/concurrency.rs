//! Concurrency tests
//!
//! The engine is synchronous, so these drive it with plain threads:
//! coupon redemption races, parallel cart mutation, parallel invoice
//! numbering and competing checkouts on one cart.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::models::{
    Address, CartOwner, Coupon, DiscountType, PaymentMethod, Product,
};
use std::sync::Arc;
use std::thread;
use store_engine::{
    CartService, CatalogService, CheckoutService, CouponService, InvoiceDraft, InvoiceService,
    StoreConfig,
};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn catalog() -> CatalogService {
    let catalog = CatalogService::new();
    catalog.upsert(Product {
        id: "kurti".into(),
        name: "Cotton Kurti".into(),
        selling_price: dec("599.00"),
        stock_quantity: 10_000,
        variants: vec![],
        is_active: true,
    });
    catalog
}

fn address() -> Address {
    Address {
        full_name: "Asha Verma".into(),
        phone: "+91-9876543210".into(),
        address_line_1: "12 Victoria Street".into(),
        address_line_2: None,
        city: "Lucknow".into(),
        state: "Uttar Pradesh".into(),
        pin_code: "226003".into(),
    }
}

fn last_use_coupon(code: &str) -> Coupon {
    Coupon {
        code: code.into(),
        description: "Last use up for grabs".into(),
        discount_type: DiscountType::Fixed,
        discount_value: dec("100"),
        minimum_order_amount: Decimal::ZERO,
        maximum_discount: None,
        usage_limit: Some(1),
        used_count: 0,
        is_active: true,
        valid_from: Utc::now() - Duration::days(1),
        valid_to: Utc::now() + Duration::days(1),
        created_at: Utc::now(),
    }
}

#[test]
fn coupon_last_use_has_exactly_one_winner() {
    let config = Arc::new(StoreConfig::default());
    let carts = CartService::new(config.clone(), catalog());
    let coupons = CouponService::new();
    coupons.insert(last_use_coupon("LASTONE")).unwrap();
    let checkout = CheckoutService::new(config, carts.clone(), coupons.clone());

    // Two customers, two carts, one remaining coupon use
    let owners = [
        CartOwner::Customer("c1".into()),
        CartOwner::Customer("c2".into()),
    ];
    for owner in &owners {
        carts.add_item(owner, "kurti", None, 2).unwrap();
    }

    let results: Vec<_> = thread::scope(|s| {
        owners
            .iter()
            .map(|owner| {
                let checkout = checkout.clone();
                s.spawn(move || {
                    checkout.place_order(
                        owner,
                        address(),
                        None,
                        PaymentMethod::Upi,
                        Some("LASTONE"),
                    )
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect()
    });

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one checkout may redeem the last use");
    assert_eq!(coupons.get("LASTONE").unwrap().used_count, 1);

    // The loser failed cleanly: its cart was restored, no order created
    let loser = owners
        .iter()
        .zip(&results)
        .find(|(_, r)| r.is_err())
        .map(|(o, _)| o)
        .unwrap();
    assert_eq!(carts.totals(loser).total_items, 2);
    let loser_id = loser.customer_id().unwrap();
    assert!(checkout.orders_for_customer(loser_id).is_empty());
}

#[test]
fn concurrent_cart_increments_are_not_lost() {
    let config = Arc::new(StoreConfig::default());
    let carts = CartService::new(config, catalog());
    let owner = CartOwner::Customer("c1".into());
    carts.add_item(&owner, "kurti", None, 1).unwrap();

    const THREADS: usize = 16;
    thread::scope(|s| {
        for _ in 0..THREADS {
            let carts = carts.clone();
            let owner = owner.clone();
            s.spawn(move || carts.add_item(&owner, "kurti", None, 1).unwrap());
        }
    });

    // 1 initial + 16 concurrent adds, none overwritten
    assert_eq!(carts.totals(&owner).total_items, 1 + THREADS as u32);
}

#[test]
fn competing_checkouts_on_one_cart_produce_one_order() {
    let config = Arc::new(StoreConfig::default());
    let carts = CartService::new(config.clone(), catalog());
    let coupons = CouponService::new();
    let checkout = CheckoutService::new(config, carts.clone(), coupons);
    let owner = CartOwner::Customer("c1".into());
    carts.add_item(&owner, "kurti", None, 3).unwrap();

    let results: Vec<_> = thread::scope(|s| {
        (0..2)
            .map(|_| {
                let checkout = checkout.clone();
                let owner = owner.clone();
                s.spawn(move || {
                    checkout.place_order(&owner, address(), None, PaymentMethod::Card, None)
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(checkout.orders_for_customer("c1").len(), 1);
    // The losing request saw an already-taken cart
    assert!(results
        .iter()
        .any(|r| r.as_ref().err() == Some(&shared::error::StoreError::EmptyCart)));
}

#[test]
fn concurrent_invoice_creation_yields_unique_sequential_numbers() {
    let service = InvoiceService::new(Arc::new(StoreConfig::default()));

    const THREADS: usize = 12;
    let mut numbers: Vec<String> = thread::scope(|s| {
        (0..THREADS)
            .map(|_| {
                let service = service.clone();
                s.spawn(move || {
                    service
                        .create_invoice(InvoiceDraft {
                            customer_name: "Meera Traders".into(),
                            issue_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                            due_date: NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
                            discount_percentage: Decimal::ZERO,
                            tax_rate: None,
                            notes: None,
                            items: vec![],
                        })
                        .unwrap()
                        .invoice_number
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect()
    });

    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), THREADS, "every invoice number is unique");
    for (i, number) in numbers.iter().enumerate() {
        assert_eq!(number, &format!("INV{:04}", i + 1));
    }
}

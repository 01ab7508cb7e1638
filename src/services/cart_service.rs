use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    auth::Identity,
    db::dao::{CartDao, CartLine, DaoBase, ListingDao},
    error::AppError,
};

pub const MAX_QUANTITY: i32 = 99;
/// Service fee is 5% of the subtotal, never more than $9.99.
pub const SERVICE_FEE_PERCENT: i64 = 5;
pub const SERVICE_FEE_CAP_CENTS: i64 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub items_count: i64,
    pub subtotal_cents: i64,
    pub service_fee_cents: i64,
    pub total_cents: i64,
}

impl CartTotals {
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let items_count: i64 = lines.iter().map(|line| i64::from(line.item.quantity)).sum();
        let subtotal_cents: i64 = lines
            .iter()
            .map(|line| line.listing.price_cents * i64::from(line.item.quantity))
            .sum();
        let service_fee_cents = service_fee(subtotal_cents);

        Self {
            items_count,
            subtotal_cents,
            service_fee_cents,
            total_cents: subtotal_cents + service_fee_cents,
        }
    }
}

fn service_fee(subtotal_cents: i64) -> i64 {
    if subtotal_cents <= 0 {
        return 0;
    }
    (subtotal_cents * SERVICE_FEE_PERCENT / 100).min(SERVICE_FEE_CAP_CENTS)
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

#[derive(Clone)]
pub struct CartService {
    cart: CartDao,
}

impl CartService {
    pub fn new(cart: CartDao) -> Self {
        Self { cart }
    }

    /// Adds `qty` to the user's line for `listing_id` and returns the new quantity.
    pub async fn add_to_cart(
        &self,
        user: &Identity,
        listing_id: i64,
        qty: i32,
    ) -> Result<i32, AppError> {
        if qty < 1 {
            return Err(AppError::validation("Quantity must be at least 1"));
        }

        let txn = self.cart.db().begin().await?;
        match add_in(&txn, user.user_id, listing_id, qty).await {
            Ok(quantity) => {
                txn.commit().await?;
                debug!(user_id = user.user_id, listing_id, quantity, "cart updated");
                Ok(quantity)
            }
            Err(err) => {
                txn.rollback().await?;
                Err(err)
            }
        }
    }

    pub async fn remove_from_cart(&self, user: &Identity, listing_id: i64) -> Result<(), AppError> {
        let removed = self.cart.remove(user.user_id, listing_id).await?;
        if removed > 0 {
            debug!(user_id = user.user_id, listing_id, "cart line removed");
        }
        Ok(())
    }

    /// Drops lines whose listing is no longer active, then returns what is left.
    pub async fn list_cart(&self, user: &Identity) -> Result<CartView, AppError> {
        let txn = self.cart.db().begin().await?;
        let result = async {
            let purged = CartDao::purge_inactive_in(&txn, user.user_id).await?;
            let lines = CartDao::lines_in(&txn, user.user_id).await?;
            Ok::<_, AppError>((purged, lines))
        }
        .await;

        let (purged, lines) = match result {
            Ok(found) => {
                txn.commit().await?;
                found
            }
            Err(err) => {
                txn.rollback().await?;
                return Err(err);
            }
        };

        if purged > 0 {
            info!(user_id = user.user_id, purged, "dropped unavailable cart lines");
        }

        let totals = CartTotals::from_lines(&lines);
        Ok(CartView { lines, totals })
    }

    /// Payments are not wired up. The cart is left untouched.
    pub async fn checkout(&self, user: &Identity) -> Result<(), AppError> {
        info!(user_id = user.user_id, "checkout refused");
        Err(AppError::checkout_disabled())
    }
}

async fn add_in<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    listing_id: i64,
    qty: i32,
) -> Result<i32, AppError> {
    let available = ListingDao::find_in(conn, listing_id)
        .await?
        .is_some_and(|listing| listing.is_active());
    if !available {
        return Err(AppError::not_found("Listing not found"));
    }

    let existing = CartDao::quantity_in(conn, user_id, listing_id)
        .await?
        .unwrap_or(0);
    let quantity = existing.saturating_add(qty);
    if quantity > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "Quantity cannot exceed {MAX_QUANTITY}"
        )));
    }

    CartDao::upsert_in(conn, user_id, listing_id, qty).await?;
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{CartTotals, SERVICE_FEE_CAP_CENTS, service_fee};
    use crate::db::{
        dao::CartLine,
        entities::{cart_item, listing},
    };

    fn line(price_cents: i64, quantity: i32) -> CartLine {
        CartLine {
            item: cart_item::Model {
                user_id: 1,
                listing_id: price_cents,
                quantity,
                added_at: Utc::now(),
            },
            listing: listing::Model {
                id: price_cents,
                owner_id: 2,
                category_id: 1,
                title: "Desk lamp".to_string(),
                description: String::new(),
                price_cents,
                condition: None,
                color: None,
                status: "active".to_string(),
                created_at: Utc::now(),
            },
        }
    }

    #[test]
    fn empty_cart_has_no_fee() {
        let totals = CartTotals::from_lines(&[]);

        assert_eq!(totals.items_count, 0);
        assert_eq!(totals.service_fee_cents, 0);
        assert_eq!(totals.total_cents, 0);
    }

    #[test]
    fn fee_is_five_percent_until_the_cap() {
        assert_eq!(service_fee(1_000), 50);
        assert_eq!(service_fee(19_980), 999);
        assert_eq!(service_fee(1_000_000), SERVICE_FEE_CAP_CENTS);
    }

    #[test]
    fn totals_multiply_price_by_quantity() {
        let totals = CartTotals::from_lines(&[line(1_200, 2), line(350, 1)]);

        assert_eq!(totals.items_count, 3);
        assert_eq!(totals.subtotal_cents, 2_750);
        assert_eq!(totals.service_fee_cents, 137);
        assert_eq!(totals.total_cents, 2_887);
    }
}

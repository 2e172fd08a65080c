//! Per-user pending line items.

use crate::{catalog, Caller, Result, ServiceError};
use entity::cart;
use sea_orm::{
    prelude::Decimal, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};

#[derive(Clone, Debug, Deserialize)]
pub struct CartAddition {
    #[serde(rename = "menuitem")]
    pub menu_item_id: i32,
    pub quantity: i32,
}

pub async fn list<C>(db: &C, caller: &Caller) -> Result<Vec<cart::Model>>
where
    C: ConnectionTrait,
{
    Ok(cart::Entity::find()
        .filter(cart::Column::UserId.eq(caller.id))
        .order_by_asc(cart::Column::Id)
        .all(db)
        .await?)
}

/// Put a menu item into the caller's cart, priced at the item's current price
#[instrument(level = "debug", skip(db, caller), fields(user_id = caller.id))]
pub async fn add<C>(db: &C, caller: &Caller, addition: CartAddition) -> Result<cart::Model>
where
    C: ConnectionTrait,
{
    if addition.quantity < 1 {
        return Err(ServiceError::Validation(
            "quantity must be at least 1".to_owned(),
        ));
    }

    let item = catalog::get_menu_item(db, addition.menu_item_id).await?;

    let existing = cart::Entity::find()
        .filter(cart::Column::UserId.eq(caller.id))
        .filter(cart::Column::MenuItemId.eq(item.id))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(ServiceError::Validation(format!(
            "menu item {} is already in the cart",
            item.id
        )));
    }

    let price = item.price * Decimal::from(addition.quantity);
    if price > catalog::max_amount() {
        return Err(ServiceError::Validation(format!(
            "line total {price} exceeds {}",
            catalog::max_amount()
        )));
    }

    let row = cart::ActiveModel {
        user_id: Set(caller.id),
        menu_item_id: Set(item.id),
        quantity: Set(addition.quantity),
        unit_price: Set(item.price),
        price: Set(price),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(cart_id = row.id, menu_item_id = item.id, price = %row.price, "added to cart");

    Ok(row)
}

/// Empty the caller's cart, returning the number of rows removed
pub async fn clear<C>(db: &C, caller: &Caller) -> Result<u64>
where
    C: ConnectionTrait,
{
    let res = cart::Entity::delete_many()
        .filter(cart::Column::UserId.eq(caller.id))
        .exec(db)
        .await?;
    info!(user_id = caller.id, rows = res.rows_affected, "cleared cart");

    Ok(res.rows_affected)
}

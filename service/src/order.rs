//! Cart-to-order conversion and role-scoped order access.

use crate::{
    account, catalog,
    group::{self, GroupKind},
    Caller, Result, Role, ServiceError,
};
use chrono::Utc;
use entity::{cart, order, order_item};
use sea_orm::{
    prelude::Decimal, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    IntoActiveModel, LoaderTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, instrument, warn};

/// Returned instead of an order when the cart holds nothing.
pub const EMPTY_CART_MESSAGE: &str = "no item in cart";

/// An order together with its line items
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: order::Model,
    #[serde(rename = "orderitems")]
    pub items: Vec<order_item::Model>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    Placed(OrderDetail),
    EmptyCart,
}

/// Fields of an order that may change after placement.
/// `delivery_crew: null` unassigns, an absent field leaves it untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrderUpdate {
    pub status: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub delivery_crew: Option<Option<i32>>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<i32>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i32>::deserialize(deserializer).map(Some)
}

/// The slice of the order table a caller may see
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderScope {
    All,
    OwnedBy(i32),
    AssignedTo(i32),
}

impl OrderScope {
    pub fn for_caller(caller: &Caller) -> Self {
        match caller.role() {
            Role::Superuser | Role::Manager => Self::All,
            Role::Customer => Self::OwnedBy(caller.id),
            Role::DeliveryCrew => Self::AssignedTo(caller.id),
        }
    }

    fn condition(self) -> Condition {
        match self {
            Self::All => Condition::all(),
            Self::OwnedBy(user_id) => Condition::all().add(order::Column::UserId.eq(user_id)),
            Self::AssignedTo(user_id) => {
                Condition::all().add(order::Column::DeliveryCrewId.eq(user_id))
            }
        }
    }
}

/// Turn the caller's cart into an order.
///
/// The order total is the sum of the cart line totals, every cart row is
/// copied into an order item and the cart is emptied. All of it happens in
/// one transaction.
#[instrument(level = "debug", skip(db, caller), fields(user_id = caller.id))]
pub async fn place<C>(db: &C, caller: &Caller) -> Result<Placement>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    let rows = cart::Entity::find()
        .filter(cart::Column::UserId.eq(caller.id))
        .order_by_asc(cart::Column::Id)
        .all(&txn)
        .await?;
    if rows.is_empty() {
        txn.rollback().await?;
        return Ok(Placement::EmptyCart);
    }

    let total: Decimal = rows.iter().map(|row| row.price).sum();
    if total > catalog::max_amount() {
        txn.rollback().await?;
        return Err(ServiceError::Validation(format!(
            "order total {total} exceeds {}",
            catalog::max_amount()
        )));
    }

    let order = order::ActiveModel {
        user_id: Set(caller.id),
        delivery_crew_id: Set(None),
        status: Set(false),
        total: Set(total),
        date: Set(Utc::now().date_naive()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        let item = order_item::ActiveModel {
            order_id: Set(order.id),
            menu_item_id: Set(row.menu_item_id),
            quantity: Set(row.quantity),
            unit_price: Set(row.unit_price),
            price: Set(row.price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    cart::Entity::delete_many()
        .filter(cart::Column::UserId.eq(caller.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    info!(order_id = order.id, items = items.len(), total = %order.total, "placed order");

    Ok(Placement::Placed(OrderDetail { order, items }))
}

pub async fn list<C>(db: &C, caller: &Caller) -> Result<Vec<OrderDetail>>
where
    C: ConnectionTrait,
{
    let orders = order::Entity::find()
        .filter(OrderScope::for_caller(caller).condition())
        .order_by_asc(order::Column::Id)
        .all(db)
        .await?;
    let items = orders.load_many(order_item::Entity, db).await?;

    Ok(orders
        .into_iter()
        .zip(items)
        .map(|(order, items)| OrderDetail { order, items })
        .collect())
}

/// Orders outside the caller's scope are reported as missing
pub async fn get<C>(db: &C, caller: &Caller, id: i32) -> Result<OrderDetail>
where
    C: ConnectionTrait,
{
    let order = find_visible(db, caller, id).await?;
    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?;

    Ok(OrderDetail { order, items })
}

/// Change status or delivery crew. Callers without any group are refused.
#[instrument(level = "debug", skip(db, caller), fields(user_id = caller.id))]
pub async fn update<C>(
    db: &C,
    caller: &Caller,
    id: i32,
    update: OrderUpdate,
) -> Result<OrderDetail>
where
    C: ConnectionTrait,
{
    if caller.role() == Role::Customer {
        warn!(order_id = id, "order update denied");
        return Err(ServiceError::Forbidden("Not Ok".to_owned()));
    }

    let mut order = find_visible(db, caller, id).await?.into_active_model();

    if let Some(status) = update.status {
        order.status = Set(status);
    }
    if let Some(crew) = update.delivery_crew {
        if let Some(crew_id) = crew {
            ensure_delivery_crew(db, crew_id).await?;
        }
        order.delivery_crew_id = Set(crew);
    }

    let order = order.update(db).await?;
    info!(
        order_id = order.id,
        status = order.status,
        delivery_crew = ?order.delivery_crew_id,
        "updated order"
    );

    get(db, caller, order.id).await
}

async fn find_visible<C>(db: &C, caller: &Caller, id: i32) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    order::Entity::find_by_id(id)
        .filter(OrderScope::for_caller(caller).condition())
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("order", id))
}

async fn ensure_delivery_crew<C>(db: &C, user_id: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    account::get_by_id(db, user_id).await?;

    if group::is_member(db, GroupKind::Delivery, user_id).await? {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "user {user_id} is not in the delivery crew"
        )))
    }
}

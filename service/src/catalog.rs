//! Menu categories and menu items.

use crate::{Result, ServiceError};
use entity::{category, menu_item, order_item};
use sea_orm::{
    prelude::Decimal, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use serde::Deserialize;
use std::str::FromStr;
use tracing::info;

pub const DEFAULT_ITEMS_PER_PAGE: u64 = 10;
pub const MAX_ITEMS_PER_PAGE: u64 = 100;

/// Largest price a `Decimal(6, 2)` column holds
pub fn max_unit_price() -> Decimal {
    Decimal::new(999_999, 2)
}

/// Largest line or order total a `Decimal(12, 2)` column holds
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

#[derive(Clone, Debug, Deserialize)]
pub struct CategoryInput {
    pub slug: String,
    pub title: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MenuItemInput {
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub inventory: i32,
    #[serde(default)]
    pub featured: bool,
    #[serde(rename = "category")]
    pub category_id: i32,
}

/// Query string of the menu item listing
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MenuItemFilter {
    /// Substring of the category title
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<u64>,
    pub perpage: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuOrdering {
    PriceAsc,
    PriceDesc,
    InventoryAsc,
    InventoryDesc,
}

impl FromStr for MenuOrdering {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "price" => Ok(Self::PriceAsc),
            "-price" => Ok(Self::PriceDesc),
            "inventory" => Ok(Self::InventoryAsc),
            "-inventory" => Ok(Self::InventoryDesc),
            other => Err(ServiceError::Validation(format!(
                "cannot order menu items by `{other}`"
            ))),
        }
    }
}

impl MenuOrdering {
    fn apply(self, select: Select<menu_item::Entity>) -> Select<menu_item::Entity> {
        match self {
            Self::PriceAsc => select.order_by_asc(menu_item::Column::Price),
            Self::PriceDesc => select.order_by_desc(menu_item::Column::Price),
            Self::InventoryAsc => select.order_by_asc(menu_item::Column::Inventory),
            Self::InventoryDesc => select.order_by_desc(menu_item::Column::Inventory),
        }
    }
}

pub async fn list_categories<C>(db: &C) -> Result<Vec<category::Model>>
where
    C: ConnectionTrait,
{
    Ok(category::Entity::find()
        .order_by_asc(category::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_category<C>(db: &C, id: i32) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("category", id))
}

pub async fn create_category<C>(db: &C, input: CategoryInput) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    validate_category(db, &input, None).await?;

    let category = category::ActiveModel {
        slug: Set(input.slug),
        title: Set(input.title),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(category_id = category.id, slug = %category.slug, "created category");

    Ok(category)
}

pub async fn update_category<C>(
    db: &C,
    id: i32,
    input: CategoryInput,
) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    let mut category = get_category(db, id).await?.into_active_model();
    validate_category(db, &input, Some(id)).await?;

    category.slug = Set(input.slug);
    category.title = Set(input.title);

    Ok(category.update(db).await?)
}

/// Categories still referenced by menu items cannot be deleted
pub async fn delete_category<C>(db: &C, id: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    let category = get_category(db, id).await?;

    let in_use = menu_item::Entity::find()
        .filter(menu_item::Column::CategoryId.eq(category.id))
        .count(db)
        .await?;
    if in_use > 0 {
        return Err(ServiceError::Validation(format!(
            "category {id} still has {in_use} menu item(s)"
        )));
    }

    category::Entity::delete_by_id(category.id).exec(db).await?;
    info!(category_id = id, "deleted category");

    Ok(())
}

async fn validate_category<C>(db: &C, input: &CategoryInput, current: Option<i32>) -> Result<()>
where
    C: ConnectionTrait,
{
    if input.title.trim().is_empty() || input.slug.trim().is_empty() {
        return Err(ServiceError::Validation(
            "title and slug may not be blank".to_owned(),
        ));
    }

    let mut taken =
        category::Entity::find().filter(category::Column::Slug.eq(input.slug.as_str()));
    if let Some(id) = current {
        taken = taken.filter(category::Column::Id.ne(id));
    }
    if taken.count(db).await? > 0 {
        return Err(ServiceError::Validation(format!(
            "category with slug `{}` already exists",
            input.slug
        )));
    }

    Ok(())
}

/// List menu items, filtered by category title and ordered as requested.
/// Without `page` every matching item is returned.
pub async fn list_menu_items<C>(
    db: &C,
    filter: &MenuItemFilter,
) -> Result<Vec<menu_item::Model>>
where
    C: ConnectionTrait,
{
    let mut select = menu_item::Entity::find();

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        select = select
            .inner_join(category::Entity)
            .filter(category::Column::Title.contains(search));
    }

    if let Some(ordering) = filter.ordering.as_deref().filter(|s| !s.is_empty()) {
        select = ordering.parse::<MenuOrdering>()?.apply(select);
    }
    select = select.order_by_asc(menu_item::Column::Id);

    let per_page = match filter.perpage {
        Some(n) if n == 0 || n > MAX_ITEMS_PER_PAGE => {
            return Err(ServiceError::Validation(format!(
                "perpage must be between 1 and {MAX_ITEMS_PER_PAGE}"
            )));
        }
        other => other,
    };

    match filter.page {
        Some(0) => Err(ServiceError::Validation(
            "page numbers start at 1".to_owned(),
        )),
        Some(page) => {
            let per_page = per_page.unwrap_or(DEFAULT_ITEMS_PER_PAGE);
            // the offset is bound as a signed 64-bit integer
            let in_range = (page - 1)
                .checked_mul(per_page)
                .is_some_and(|offset| offset <= i64::MAX as u64);
            if !in_range {
                return Err(ServiceError::Validation(format!("page {page} is out of range")));
            }
            Ok(select.paginate(db, per_page).fetch_page(page - 1).await?)
        }
        None => Ok(select.limit(per_page).all(db).await?),
    }
}

pub async fn get_menu_item<C>(db: &C, id: i32) -> Result<menu_item::Model>
where
    C: ConnectionTrait,
{
    menu_item::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("menu item", id))
}

pub async fn create_menu_item<C>(db: &C, input: MenuItemInput) -> Result<menu_item::Model>
where
    C: ConnectionTrait,
{
    validate_menu_item(db, &input).await?;

    let item = menu_item::ActiveModel {
        title: Set(input.title),
        price: Set(input.price),
        inventory: Set(input.inventory),
        featured: Set(input.featured),
        category_id: Set(input.category_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(menu_item_id = item.id, price = %item.price, "created menu item");

    Ok(item)
}

pub async fn update_menu_item<C>(
    db: &C,
    id: i32,
    input: MenuItemInput,
) -> Result<menu_item::Model>
where
    C: ConnectionTrait,
{
    let mut item = get_menu_item(db, id).await?.into_active_model();
    validate_menu_item(db, &input).await?;

    item.title = Set(input.title);
    item.price = Set(input.price);
    item.inventory = Set(input.inventory);
    item.featured = Set(input.featured);
    item.category_id = Set(input.category_id);

    Ok(item.update(db).await?)
}

/// Items that appear on placed orders cannot be deleted
pub async fn delete_menu_item<C>(db: &C, id: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    let item = get_menu_item(db, id).await?;

    let ordered = order_item::Entity::find()
        .filter(order_item::Column::MenuItemId.eq(item.id))
        .count(db)
        .await?;
    if ordered > 0 {
        return Err(ServiceError::Validation(format!(
            "menu item {id} appears on {ordered} order line(s)"
        )));
    }

    menu_item::Entity::delete_by_id(item.id).exec(db).await?;
    info!(menu_item_id = id, "deleted menu item");

    Ok(())
}

async fn validate_menu_item<C>(db: &C, input: &MenuItemInput) -> Result<()>
where
    C: ConnectionTrait,
{
    if input.title.trim().is_empty() {
        return Err(ServiceError::Validation("title may not be blank".to_owned()));
    }
    if input.price.is_sign_negative() {
        return Err(ServiceError::Validation("price may not be negative".to_owned()));
    }
    if input.price > max_unit_price() {
        return Err(ServiceError::Validation(format!(
            "price may not exceed {}",
            max_unit_price()
        )));
    }
    if input.inventory < 0 {
        return Err(ServiceError::Validation(
            "inventory may not be negative".to_owned(),
        ));
    }
    get_category(db, input.category_id).await?;

    Ok(())
}

pub mod auth_token;
pub mod cart;
pub mod category;
pub mod group;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod user;
pub mod user_group;

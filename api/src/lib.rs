mod auth;
mod config;
mod error;
mod extract;
mod handlers;

pub use auth::AuthUser;
pub use config::{AdminAccount, Config, ConfigError};
pub use error::ApiError;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use little_lemon_service::{
    account,
    sea_orm::{Database, DatabaseConnection},
};
use migration::{Migrator, MigratorTrait};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct AppState {
    pub conn: DatabaseConnection,
}

/// Build the HTTP surface over an already migrated database
pub fn router(state: AppState) -> Router {
    // reads are open, every other method needs a token
    let catalog = Router::new()
        .route(
            "/categories",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route(
            "/categories/{id}",
            get(handlers::catalog::get_category)
                .put(handlers::catalog::update_category)
                .delete(handlers::catalog::delete_category),
        )
        .route(
            "/menu-items",
            get(handlers::catalog::list_menu_items).post(handlers::catalog::create_menu_item),
        )
        .route(
            "/menu-items/{id}",
            get(handlers::catalog::get_menu_item)
                .put(handlers::catalog::update_menu_item)
                .delete(handlers::catalog::delete_menu_item),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth_for_writes,
        ));

    Router::new()
        .merge(catalog)
        .route(
            "/cart",
            get(handlers::cart::list)
                .post(handlers::cart::add)
                .delete(handlers::cart::clear),
        )
        .route(
            "/orders",
            get(handlers::order::list).post(handlers::order::place),
        )
        .route(
            "/orders/{id}",
            get(handlers::order::get).put(handlers::order::update),
        )
        .route(
            "/groups/{group}",
            get(handlers::group::members)
                .post(handlers::group::add_member)
                .delete(handlers::group::remove_member),
        )
        .route("/register", post(handlers::account::register))
        .route(
            "/users",
            get(handlers::account::list_users).post(handlers::account::create_user),
        )
        .route("/users/me", get(handlers::account::me))
        .route(
            "/users/{id}",
            get(handlers::account::get_user)
                .put(handlers::account::update_user)
                .delete(handlers::account::delete_user),
        )
        .route("/users/{id}/assign_group", post(handlers::group::assign))
        .route("/token/login", post(handlers::account::login))
        .route("/token/logout", post(handlers::account::logout))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn start() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let config = Config::from_env()?;

    let conn = Database::connect(config.database_url.as_str()).await?;
    Migrator::up(&conn, None).await?;

    if let Some(admin) = &config.admin {
        account::ensure_superuser(&conn, &admin.username, &admin.password).await?;
    }

    let app = router(AppState { conn });

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %listener.local_addr()?, "little lemon is listening");
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn main() {
    let result = start();

    if let Some(err) = result.err() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

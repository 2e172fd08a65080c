use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use little_lemon_api::{router, AppState};
use little_lemon_service::{account, sea_orm::Database};
use migration::{Migrator, MigratorTrait};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let conn = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&conn, None).await.unwrap();
        account::ensure_superuser(&conn, "admin", "admin").await.unwrap();

        Self {
            router: router(AppState { conn }),
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Register `username` and log in, returning the token
    async fn customer(&self, username: &str) -> String {
        let (status, _) = self
            .post(
                "/register",
                None,
                json!({ "username": username, "password": "lemon" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        self.login(username, "lemon").await
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/token/login",
                None,
                json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["auth_token"].as_str().unwrap().to_owned()
    }

    /// Create the "mains" category with two items, returning their ids
    async fn menu(&self, token: &str) -> (i64, i64) {
        let (status, category) = self
            .post(
                "/categories",
                Some(token),
                json!({ "slug": "mains", "title": "Mains" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let mut ids = Vec::new();
        for (title, price) in [("Bruschetta", "10.00"), ("Lemon Dessert", "15.00")] {
            let (status, item) = self
                .post(
                    "/menu-items",
                    Some(token),
                    json!({
                        "title": title,
                        "price": price,
                        "inventory": 10,
                        "category": category["id"],
                    }),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            ids.push(item["id"].as_i64().unwrap());
        }

        (ids[0], ids[1])
    }
}

fn decimal(value: &Value) -> little_lemon_service::sea_orm::prelude::Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

#[tokio::test]
async fn health() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn catalog_reads_are_open_and_writes_need_a_token() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = app
        .post("/categories", None, json!({ "slug": "mains", "title": "Mains" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = app
        .post(
            "/categories",
            Some("bogus"),
            json!({ "slug": "mains", "title": "Mains" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.customer("ursula").await;
    let (a, _) = app.menu(&token).await;

    let (status, items) = app.get("/menu-items?ordering=-price", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items[0]["title"], "Lemon Dessert");
    assert_eq!(items[1]["title"], "Bruschetta");

    let (status, item) = app.get(&format!("/menu-items/{a}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&item["price"]), dec!(10.00));

    let (status, _) = app
        .send(Method::DELETE, &format!("/menu-items/{a}"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .send(Method::DELETE, &format!("/menu-items/{a}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/menu-items/{a}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cart_to_order() {
    let app = TestApp::new().await;
    let token = app.customer("ursula").await;
    let (a, b) = app.menu(&token).await;

    let (status, body) = app.post("/orders", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "no item in cart" }));

    for id in [a, b] {
        let (status, row) = app
            .post("/cart", Some(&token), json!({ "menuitem": id, "quantity": 1 }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(row["menuitem"], id);
    }
    let (status, _) = app
        .post("/cart", Some(&token), json!({ "menuitem": a, "quantity": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, order) = app.post("/orders", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&order["total"]), dec!(25.00));
    assert_eq!(order["status"], false);
    assert_eq!(order["delivery_crew"], Value::Null);
    assert_eq!(order["orderitems"].as_array().unwrap().len(), 2);

    let (status, cart) = app.get("/cart", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart, json!([]));

    let (status, orders) = app.get("/orders", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let uri = format!("/orders/{}", order["id"]);
    let (status, body) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "status": true })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "Not Ok" }));
}

#[tokio::test]
async fn clearing_the_cart() {
    let app = TestApp::new().await;
    let token = app.customer("ursula").await;
    let (a, _) = app.menu(&token).await;

    app.post("/cart", Some(&token), json!({ "menuitem": a, "quantity": 2 }))
        .await;
    let (status, body) = app.send(Method::DELETE, "/cart", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));

    let (_, cart) = app.get("/cart", Some(&token)).await;
    assert_eq!(cart, json!([]));

    let (status, _) = app.get("/cart", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn group_management() {
    let app = TestApp::new().await;
    let admin = app.login("admin", "admin").await;
    let manny = app.customer("manny").await;
    let ursula = app.customer("ursula").await;
    app.customer("dee").await;

    // a customer may neither promote managers nor hire delivery crew
    let (status, _) = app
        .post("/groups/manager", Some(&ursula), json!({ "username": "manny" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app
        .post("/groups/delivery", Some(&ursula), json!({ "username": "dee" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "forbidden" }));

    let (status, body) = app
        .post("/groups/manager", Some(&admin), json!({ "username": "manny" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "user added to the manager group" }));

    let (status, managers) = app.get("/groups/manager", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(managers[0]["username"], "manny");
    assert!(managers[0].get("password").is_none());

    let (status, body) = app
        .post("/groups/delivery", Some(&manny), json!({ "username": "dee" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "user added to the delivery group" }));

    let (status, _) = app
        .post("/groups/delivery", Some(&manny), json!({ "username": "ghost" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(
            Method::DELETE,
            "/groups/delivery",
            Some(&manny),
            Some(json!({ "username": "dee" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "message": "user removed from the delivery group" })
    );

    let (status, crew) = app.get("/groups/delivery", Some(&manny)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(crew, json!([]));
}

#[tokio::test]
async fn delivery_crew_sees_assigned_orders() {
    let app = TestApp::new().await;
    let admin = app.login("admin", "admin").await;
    let ursula = app.customer("ursula").await;
    let dee = app.customer("dee").await;
    let (a, _) = app.menu(&ursula).await;

    app.post("/groups/delivery", Some(&admin), json!({ "username": "dee" }))
        .await;
    let (_, me) = app.get("/users/me", Some(&dee)).await;
    assert_eq!(me["groups"], json!(["Delivery"]));

    app.post("/cart", Some(&ursula), json!({ "menuitem": a, "quantity": 1 }))
        .await;
    let (_, order) = app.post("/orders", Some(&ursula), json!({})).await;
    let uri = format!("/orders/{}", order["id"]);

    let (_, visible) = app.get("/orders", Some(&dee)).await;
    assert_eq!(visible, json!([]));
    let (status, _) = app.get(&uri, Some(&dee)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, assigned) = app
        .send(
            Method::PUT,
            &uri,
            Some(&admin),
            Some(json!({ "delivery_crew": me["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["delivery_crew"], me["id"]);

    let (_, visible) = app.get("/orders", Some(&dee)).await;
    assert_eq!(visible.as_array().unwrap().len(), 1);

    let (status, delivered) = app
        .send(Method::PUT, &uri, Some(&dee), Some(json!({ "status": true })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delivered["status"], true);

    let (_, everything) = app.get("/orders", Some(&admin)).await;
    assert_eq!(everything.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn accounts() {
    let app = TestApp::new().await;
    let token = app.customer("ursula").await;

    let (status, _) = app
        .post(
            "/register",
            None,
            json!({ "username": "ursula", "password": "again" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/token/login", None, json!({ "username": "ursula", "password": "nope" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/register", None, json!({ "username": 42 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, me) = app.get("/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "ursula");
    assert_eq!(me["groups"], json!([]));

    let (status, _) = app.send(Method::POST, "/token/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get("/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_administration() {
    let app = TestApp::new().await;
    let admin = app.login("admin", "admin").await;
    let token = app.customer("ursula").await;

    let (status, _) = app.get("/users", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, created) = app
        .post(
            "/users",
            Some(&admin),
            json!({ "username": "dee", "password": "lemon" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let dee = created["id"].as_i64().unwrap();

    let (status, users) = app.get("/users", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["admin", "ursula", "dee"]);
    assert!(users[0].get("password").is_none());

    let (status, assigned) = app
        .post(
            &format!("/users/{dee}/assign_group"),
            Some(&admin),
            json!({ "group": "Delivery" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned, json!({ "status": "user added to group" }));

    let (_, crew) = app.get("/groups/delivery", Some(&admin)).await;
    assert_eq!(crew[0]["username"], "dee");

    let (status, _) = app
        .post(
            &format!("/users/{dee}/assign_group"),
            Some(&admin),
            json!({ "group": "Chefs" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .post(
            &format!("/users/{dee}/assign_group"),
            Some(&token),
            json!({ "group": "Manager" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, renamed) = app
        .send(
            Method::PUT,
            &format!("/users/{dee}"),
            Some(&admin),
            Some(json!({ "email": "dee@littlelemon.test" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["username"], "dee");
    assert_eq!(renamed["email"], "dee@littlelemon.test");

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/users/{dee}"),
            Some(&admin),
            Some(json!({ "username": "ursula" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/users/{dee}");
    let (status, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_menu_pages_are_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .get("/menu-items?page=3&perpage=18446744073709551615", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("perpage"));
}

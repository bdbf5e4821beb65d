//! Route definitions for the Retail Back Office

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - shop management
        .nest("/shops", shop_routes())
        // Protected routes - catalog (brands/categories)
        .nest("/brands", brand_routes())
        .nest("/categories", category_routes())
        // Protected routes - product management
        .nest("/products", product_routes())
        // Protected routes - employee management
        .nest("/employees", employee_routes())
        // Protected routes - order management
        .nest("/orders", order_routes())
        // Protected routes - stock movements
        .nest("/movements", movement_routes())
        // Protected routes - expenses/income
        .nest("/finance", finance_routes())
        // Protected routes - reporting
        .nest("/reports", report_routes())
}

/// Authentication routes (register/login/refresh public, profile protected)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route(
            "/me",
            get(handlers::me).route_layer(middleware::from_fn(auth_middleware)),
        )
}

/// Shop management routes (protected)
fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_shops).post(handlers::create_shop))
        .route(
            "/:shop_id",
            get(handlers::get_shop)
                .put(handlers::update_shop)
                .delete(handlers::delete_shop),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Brand routes (protected)
fn brand_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_brands).post(handlers::create_brand))
        .route(
            "/:brand_id",
            put(handlers::update_brand).delete(handlers::delete_brand),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Category routes (protected)
fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/:category_id",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product management routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/low-stock", get(handlers::list_low_stock))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Employee management routes (protected)
fn employee_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_employees).post(handlers::create_employee),
        )
        .route(
            "/:employee_id",
            get(handlers::get_employee)
                .put(handlers::update_employee)
                .delete(handlers::delete_employee),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Order management routes (protected)
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route(
            "/:order_id",
            get(handlers::get_order).delete(handlers::delete_order),
        )
        .route("/:order_id/status", put(handlers::update_order_status))
        .route("/:order_id/payment", put(handlers::update_order_payment))
        .route("/:order_id/returns", put(handlers::record_order_returns))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock movement routes (protected)
fn movement_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_movements))
        .route("/outgoing", post(handlers::create_outgoing))
        .route("/incoming", post(handlers::create_incoming))
        .route("/incoming-admin", post(handlers::create_incoming_admin))
        .route("/check", post(handlers::check_sufficiency))
        .route(
            "/:movement_id",
            get(handlers::get_movement)
                .put(handlers::update_movement)
                .delete(handlers::delete_movement),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Expense/income routes (protected)
fn finance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/entries",
            get(handlers::list_finance_entries).post(handlers::create_finance_entry),
        )
        .route(
            "/entries/:entry_id",
            put(handlers::update_finance_entry).delete(handlers::delete_finance_entry),
        )
        .route("/summary", get(handlers::get_finance_summary))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Reporting routes (protected)
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/stock", get(handlers::get_stock_report))
        .route("/movements", get(handlers::get_movement_report))
        .route_layer(middleware::from_fn(auth_middleware))
}

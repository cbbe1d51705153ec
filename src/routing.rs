//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_forgot_password_page, get_log_in_page, get_log_out,
        get_register_page, post_log_in, register_user,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_page,
        get_edit_category_page, get_new_category_page, update_category_endpoint,
    },
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    profile::{get_profile_page, toggle_dark_mode_endpoint, update_profile_endpoint},
    transaction::{
        create_expense_endpoint, create_income_endpoint, delete_expense_endpoint,
        delete_income_endpoint, export_expenses, export_income, get_edit_expense_page,
        get_edit_income_page, get_expenses_page, get_income_page, get_new_expense_page,
        get_new_income_page, update_expense_endpoint, update_income_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .route(endpoints::NEW_EXPENSE_VIEW, get(get_new_expense_page))
        .route(endpoints::EDIT_EXPENSE_VIEW, get(get_edit_expense_page))
        .route(endpoints::EXPORT_EXPENSES, get(export_expenses))
        .route(endpoints::INCOME_VIEW, get(get_income_page))
        .route(endpoints::NEW_INCOME_VIEW, get(get_new_income_page))
        .route(endpoints::EDIT_INCOME_VIEW, get(get_edit_income_page))
        .route(endpoints::EXPORT_INCOME, get(export_income))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_new_category_page))
        .route(endpoints::EDIT_CATEGORY_VIEW, get(get_edit_category_page))
        .route(endpoints::PROFILE_VIEW, get(get_profile_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::EXPENSES_API, post(create_expense_endpoint))
            .route(
                endpoints::EXPENSE_API,
                put(update_expense_endpoint).delete(delete_expense_endpoint),
            )
            .route(endpoints::INCOME_API, post(create_income_endpoint))
            .route(
                endpoints::INCOME_ITEM_API,
                put(update_income_endpoint).delete(delete_income_endpoint),
            )
            .route(endpoints::CATEGORIES_API, post(create_category_endpoint))
            .route(
                endpoints::CATEGORY_API,
                put(update_category_endpoint).delete(delete_category_endpoint),
            )
            .route(endpoints::PROFILE_API, put(update_profile_endpoint))
            .route(endpoints::DARK_MODE_API, post(toggle_dark_mode_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppConfig, AppState,
        auth::COOKIE_TOKEN,
        endpoints::{self, format_endpoint},
    };

    use super::build_router;

    const PASSWORD: &str = "iamtestingwhethericancreateanewuser";

    fn get_test_server() -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let state =
            AppState::new(connection, "42", AppConfig::default()).expect("Could not create app state");

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    async fn register(server: &TestServer, username: &str) -> Cookie<'static> {
        let email = format!("{username}@example.com");
        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("username", username),
                ("email", email.as_str()),
                ("password", PASSWORD),
                ("confirm_password", PASSWORD),
            ])
            .await;

        response.assert_status_see_other();
        response.cookie(COOKIE_TOKEN)
    }

    #[tokio::test]
    async fn root_redirects_to_log_in_without_cookie() {
        let server = get_test_server();

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_see_other();
        assert!(
            response
                .header("location")
                .to_str()
                .unwrap()
                .starts_with(endpoints::LOG_IN_VIEW)
        );
    }

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let server = get_test_server();
        let cookie = register(&server, "ada").await;

        let response = server.get(endpoints::ROOT).add_cookie(cookie).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let server = get_test_server();

        let response = server.get("/no/such/page").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_routes_use_hx_redirect_without_cookie() {
        let server = get_test_server();

        let response = server
            .post(endpoints::EXPENSES_API)
            .form(&[("title", "Coffee"), ("amount", "4.50")])
            .await;

        response.assert_status_ok();
        assert!(
            response
                .header("hx-redirect")
                .to_str()
                .unwrap()
                .starts_with(endpoints::LOG_IN_VIEW)
        );
    }

    #[tokio::test]
    async fn new_user_can_record_and_export_expenses() {
        let server = get_test_server();
        let cookie = register(&server, "ada").await;

        server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(cookie.clone())
            .await
            .assert_status_ok();
        server
            .post(endpoints::EXPENSES_API)
            .add_cookie(cookie.clone())
            .form(&[
                ("title", "Coffee"),
                ("amount", "4.50"),
                ("date", "2025-01-05"),
            ])
            .await
            .assert_status_see_other();

        let response = server
            .get(endpoints::EXPORT_EXPENSES)
            .add_cookie(cookie)
            .await;

        response.assert_status_ok();
        let csv = response.text();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Title,Amount,Category,Date,Description,Created At");
        assert!(lines[1].starts_with("Coffee,4.50,,2025-01-05,,"), "got {csv}");
    }

    #[tokio::test]
    async fn users_cannot_see_each_others_categories() {
        let server = get_test_server();
        let ada = register(&server, "ada").await;
        let grace = register(&server, "grace").await;

        let response = server
            .get(&format_endpoint(endpoints::EDIT_CATEGORY_VIEW, 1))
            .add_cookie(ada)
            .await;
        response.assert_status_ok();

        let response = server
            .get(&format_endpoint(endpoints::EDIT_CATEGORY_VIEW, 1))
            .add_cookie(grace)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}

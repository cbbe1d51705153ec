//! Authentication middleware that validates cookies, extends sessions, and handles redirects.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        UserID,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
        user::get_user_by_id,
    },
    endpoints,
    timezone::get_local_offset,
};

/// How far the session is pushed out on each authenticated request.
const SLIDING_SESSION_DURATION: Duration = Duration::minutes(5);

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection, used to check the user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

fn user_exists(user_id: UserID, state: &AuthState) -> Result<bool, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match get_user_by_id(user_id, &connection) {
        Ok(_) => Ok(true),
        Err(Error::NotFound) => Ok(false),
        Err(error) => Err(error),
    }
}

/// Checks for a valid auth cookie belonging to an existing user.
///
/// On success the [UserID] is added to the request extensions and the
/// session is extended, otherwise `get_redirect` builds the response that
/// sends the client to the log-in page.
#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_redirect: impl Fn(&str) -> Response,
) -> Response {
    let log_in_redirect_url = build_log_in_redirect_url(&request).unwrap_or_else(|| {
        build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    });

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Error getting local timezone. Redirecting to log in page.");
        return get_redirect(&log_in_redirect_url);
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to log in page.");
            return get_redirect(&log_in_redirect_url);
        }
    };

    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(_) => return get_redirect(&log_in_redirect_url),
    };

    match user_exists(user_id, &state) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("Auth cookie for deleted user {user_id}. Redirecting to log in page.");
            return get_redirect(&log_in_redirect_url);
        }
        Err(error) => {
            tracing::error!("Could not check user {user_id}: {error}");
            return get_redirect(&log_in_redirect_url);
        }
    }

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(
        jar.clone(),
        SLIDING_SESSION_DURATION,
        local_offset,
    ) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending cookie duration: {err:?}. Rolling back cookie jar.");
            jar
        }
    };

    // Handlers such as log out set their own cookies, which must not be overwritten.
    if parts.headers.get(SET_COOKIE).is_none() {
        for (key, val) in jar.into_response().headers().iter() {
            if key == SET_COOKIE {
                parts.headers.append(key, val.to_owned());
            }
        }
    }

    Response::from_parts(parts, body)
}

/// Middleware for pages: redirects to the log-in page if the request is not authenticated.
///
/// Route handlers can use `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        Redirect::to(redirect_url).into_response()
    })
    .await
}

/// Middleware for HTMX endpoints: responds with an `HX-Redirect` to the
/// log-in page if the request is not authenticated.
///
/// Route handlers can use `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}

#[cfg(test)]
mod auth_guard_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Router,
        extract::{Path, State},
        middleware,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key, SameSite},
    };
    use axum_test::TestServer;
    use sha2::Digest;
    use time::{Duration, OffsetDateTime, UtcOffset};

    use crate::{
        Error,
        auth::{
            COOKIE_TOKEN, UserID, auth_guard, auth_guard_hx, cookie::set_auth_cookie, delete_user,
            middleware::AuthState,
        },
        endpoints,
        test_utils::get_test_connection_with_user,
    };

    async fn test_handler(Extension(user_id): Extension<UserID>) -> String {
        format!("Hello, user {user_id}!")
    }

    /// Logs in as `user_id` with a cookie that lasts `seconds`.
    async fn stub_log_in_route(
        State(_state): State<AuthState>,
        Path((user_id, seconds)): Path<(i64, i64)>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Error> {
        set_auth_cookie(
            jar,
            UserID::new(user_id),
            Duration::seconds(seconds),
            UtcOffset::UTC,
        )
    }

    const TEST_LOG_IN_ROUTE_PATH: &str = "/log_in/{user_id}/{seconds}";
    const TEST_PROTECTED_ROUTE: &str = "/protected";
    const TEST_API_ROUTE: &str = "/api/protected";

    fn get_state() -> (AuthState, UserID) {
        let (connection, user) = get_test_connection_with_user();
        let hash = sha2::Sha512::digest("nafstenoas");

        let state = AuthState {
            cookie_key: Key::from(&hash),
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, user.id)
    }

    fn get_test_server(state: AuthState) -> TestServer {
        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route(TEST_LOG_IN_ROUTE_PATH, post(stub_log_in_route))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn log_in_path(user_id: UserID, seconds: i64) -> String {
        format!("/log_in/{user_id}/{seconds}")
    }

    #[track_caller]
    fn assert_redirects_to_log_in(response: &axum_test::TestResponse) {
        response.assert_status_see_other();
        let expected_query =
            serde_urlencoded::to_string([("redirect_url", TEST_PROTECTED_ROUTE)]).unwrap();
        let expected_location = format!("{}?{}", endpoints::LOG_IN_VIEW, expected_query);
        assert_eq!(response.header("location"), expected_location);
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(1),
            "got date time {left:?}, want {right:?}"
        );
    }

    #[tokio::test]
    async fn protected_route_receives_user_id() {
        let (state, user_id) = get_state();
        let server = get_test_server(state);
        let response = server.post(&log_in_path(user_id, 300)).await;
        response.assert_status_ok();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(response.cookie(COOKIE_TOKEN))
            .await;

        response.assert_status_ok();
        response.assert_text(format!("Hello, user {user_id}!"));
    }

    #[tokio::test]
    async fn auth_guard_extends_valid_cookie_duration() {
        let (state, user_id) = get_state();
        let server = get_test_server(state);
        let response = server.post(&log_in_path(user_id, 5)).await;
        let response_time = OffsetDateTime::now_utc();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookies(response.cookies())
            .await;

        let auth_cookie = response.cookie(COOKIE_TOKEN);
        assert_date_time_close(
            auth_cookie.expires_datetime().unwrap(),
            response_time + Duration::minutes(5),
        );
        assert_eq!(auth_cookie.secure(), Some(true));
        assert_eq!(auth_cookie.http_only(), Some(true));
        assert_eq!(auth_cookie.same_site(), Some(SameSite::Strict));
    }

    #[tokio::test]
    async fn no_auth_cookie_redirects_to_log_in() {
        let (state, _) = get_state();
        let server = get_test_server(state);

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        assert_redirects_to_log_in(&response);
    }

    #[tokio::test]
    async fn invalid_auth_cookie_redirects_to_log_in() {
        let (state, _) = get_state();
        let server = get_test_server(state);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::build((COOKIE_TOKEN, "FOOBAR")).build())
            .await;

        assert_redirects_to_log_in(&response);
    }

    #[tokio::test]
    async fn expired_token_redirects_to_log_in() {
        let (state, user_id) = get_state();
        let server = get_test_server(state);
        let response = server.post(&log_in_path(user_id, -1)).await;

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(response.cookie(COOKIE_TOKEN))
            .await;

        assert_redirects_to_log_in(&response);
    }

    #[tokio::test]
    async fn deleted_user_redirects_to_log_in() {
        let (state, user_id) = get_state();
        let server = get_test_server(state.clone());
        let response = server.post(&log_in_path(user_id, 300)).await;
        delete_user(user_id, &state.db_connection.lock().unwrap()).unwrap();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(response.cookie(COOKIE_TOKEN))
            .await;

        assert_redirects_to_log_in(&response);
    }

    #[tokio::test]
    async fn api_route_uses_hx_current_url_for_redirect() {
        let (state, _) = get_state();
        let app = Router::new()
            .route(TEST_API_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx))
            .with_state(state);
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let current_url = "/expenses?search=coffee&page=2";

        let response = server
            .get(TEST_API_ROUTE)
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", current_url)
            .await;

        response.assert_status_ok();
        let expected_query = serde_urlencoded::to_string([("redirect_url", current_url)]).unwrap();
        let expected_location = format!("{}?{}", endpoints::LOG_IN_VIEW, expected_query);
        assert_eq!(response.header("hx-redirect"), expected_location);
    }
}

//! The registration page and the endpoint that creates a new account.
//!
//! Registering creates the user, their profile and their default categories
//! in a single database transaction, then logs the new user in.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        NewUser, PasswordHash, User, ValidatedPassword,
        cookie::set_auth_cookie,
        user::{create_user, validate_email, validate_username},
    },
    category::seed_default_categories,
    endpoints,
    html::{base, link, log_in_register, password_input, submit_button, text_input},
    internal_server_error::get_internal_server_error_redirect,
    profile::get_or_create_profile,
    timezone::get_local_offset,
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

/// Error messages shown next to the registration form fields.
#[derive(Default)]
struct FieldErrors<'a> {
    username: Option<&'a str>,
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(form: &RegisterForm, errors: FieldErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("username", "Username", "text", &form.username, true, errors.username))
            (text_input("email", "Email", "email", &form.email, true, errors.email))
            (text_input("first_name", "First Name", "text", &form.first_name, false, None))
            (text_input("last_name", "Last Name", "text", &form.last_name, false, None))
            (password_input("password", "Password", PASSWORD_INPUT_MIN_LENGTH, errors.password))
            (password_input(
                "confirm_password",
                "Confirm Password",
                PASSWORD_INPUT_MIN_LENGTH,
                errors.confirm_password,
            ))

            (submit_button("Create Account"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form(&RegisterForm::default(), FieldErrors::default());
    let content = log_in_register("Create Account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The data entered in the registration form.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
}

/// Create the user with their profile and default categories.
///
/// Nothing is saved if any step fails.
fn create_account(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    // Using unchecked_transaction because we only have &Connection from the MutexGuard.
    let transaction = connection.unchecked_transaction()?;

    let user = create_user(new_user, &transaction)?;
    get_or_create_profile(user.id, &transaction)?;
    seed_default_categories(&*transaction, user.id)?;

    transaction.commit()?;

    Ok(user)
}

/// Handle registration form submissions.
///
/// On success the auth cookie is set and the client is redirected to the
/// dashboard. Otherwise the form is returned with the problems highlighted.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let username = match validate_username(&user_data.username) {
        Ok(username) => username,
        Err(error) => {
            return render_errors(&user_data, FieldErrors {
                username: Some(&error.to_string()),
                ..Default::default()
            });
        }
    };

    let email = match validate_email(&user_data.email) {
        Ok(email) => email,
        Err(error) => {
            return render_errors(&user_data, FieldErrors {
                email: Some(&error.to_string()),
                ..Default::default()
            });
        }
    };

    let validated_password = match ValidatedPassword::new(
        &user_data.password,
        &[
            username.as_str(),
            email.as_str(),
            user_data.first_name.as_str(),
            user_data.last_name.as_str(),
        ],
    ) {
        Ok(password) => password,
        Err(error) => {
            return render_errors(&user_data, FieldErrors {
                password: Some(&error.to_string()),
                ..Default::default()
            });
        }
    };

    if user_data.password != user_data.confirm_password {
        return render_errors(&user_data, FieldErrors {
            confirm_password: Some("Passwords do not match"),
            ..Default::default()
        });
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");

            return get_internal_server_error_redirect();
        }
    };

    let Some(local_timezone) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let new_user = NewUser {
        username,
        email,
        first_name: user_data.first_name.clone(),
        last_name: user_data.last_name.clone(),
        password_hash,
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return get_internal_server_error_redirect();
            }
        };

        match create_account(new_user, &connection) {
            Ok(user) => user,
            Err(error @ Error::DuplicateUsername(_)) => {
                return render_errors(&user_data, FieldErrors {
                    username: Some(&error.to_string()),
                    ..Default::default()
                });
            }
            Err(error @ Error::DuplicateEmail(_)) => {
                return render_errors(&user_data, FieldErrors {
                    email: Some(&error.to_string()),
                    ..Default::default()
                });
            }
            Err(error) => {
                tracing::error!("An unhandled error occurred while inserting a new user: {error}");

                return get_internal_server_error_redirect();
            }
        }
    };

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_timezone) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");

            get_internal_server_error_redirect()
        }
    }
}

fn render_errors(form: &RegisterForm, errors: FieldErrors) -> Response {
    registration_form(form, errors).into_response()
}

#[cfg(test)]
mod get_register_page_tests {
    use scraper::Selector;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_status_ok, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    use super::get_register_page;

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let title = document
            .select(&Selector::parse("h1").unwrap())
            .next()
            .expect("want an h1");
        assert_eq!(title.text().collect::<String>().trim(), "Create Account");

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::USERS, "hx-post");
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");

        let links: Vec<_> = form
            .select(&Selector::parse("a[href]").unwrap())
            .map(|link| link.value().attr("href"))
            .collect();
        assert_eq!(links, [Some(endpoints::LOG_IN_VIEW)]);
    }
}

//! The profile page and the endpoints for changing the user's details and settings.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{User, UserID, get_user_by_id, update_user_details},
    endpoints,
    html::{
        FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dark_mode_script, submit_button,
    },
    navigation::NavBar,
    profile::{
        Profile,
        db::{
            MAX_CURRENCY_LENGTH, get_or_create_profile, toggle_dark_mode, update_currency,
            validate_currency,
        },
    },
};

/// The state needed for the profile page and endpoints.
#[derive(Debug, Clone)]
pub struct ProfileState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The editable fields on the profile page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub currency: String,
}

impl ProfileForm {
    fn from_user(user: &User, profile: &Profile) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            currency: profile.currency.clone(),
        }
    }
}

/// Render the profile page.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    let profile = get_or_create_profile(user_id, &connection)?;
    let form = ProfileForm::from_user(&user, &profile);

    let content = html! {
        (NavBar::new(endpoints::PROFILE_VIEW).into_html())

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-1" { "Profile" }
            p class="mb-4 text-sm text-gray-500 dark:text-gray-400"
            {
                "Logged in as " strong { (user.username) }
            }

            (profile_form_view(&form, None))
        }
    };

    Ok(base("Profile", &[dark_mode_script(profile.dark_mode)], &content).into_response())
}

/// Update the user's name, email and currency symbol.
///
/// Validation errors are shown in the returned form and nothing is saved.
pub async fn update_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match save_profile(user_id, &form, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::PROFILE_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) if error.is_validation_error() => {
            profile_form_view(&form, Some(&format!("Error: {error}"))).into_response()
        }
        Err(error) => {
            tracing::error!("Could not update the profile of user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn save_profile(user_id: UserID, form: &ProfileForm, connection: &Connection) -> Result<(), Error> {
    let currency = validate_currency(&form.currency)?;

    // Using unchecked_transaction because we only have &Connection from the MutexGuard.
    let transaction = connection.unchecked_transaction()?;
    update_user_details(
        user_id,
        &form.email,
        &form.first_name,
        &form.last_name,
        &transaction,
    )?;
    update_currency(user_id, &currency, &transaction)?;
    transaction.commit()?;

    Ok(())
}

/// The response body of the dark mode endpoint.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct DarkModeResponse {
    pub dark_mode: bool,
}

/// Flip the user's dark mode setting and return the new value as JSON.
pub async fn toggle_dark_mode_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match toggle_dark_mode(user_id, &connection) {
        Ok(dark_mode) => Json(DarkModeResponse { dark_mode }).into_response(),
        Err(error) => {
            tracing::error!("Could not toggle dark mode for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn profile_form_view(form: &ProfileForm, error_message: Option<&str>) -> Markup {
    let optional_input = |name: &str, label: &str, value: &str| {
        html! {
            div
            {
                label for=(name) class=(FORM_LABEL_STYLE) { (label) }
                input
                    type="text"
                    name=(name)
                    id=(name)
                    value=(value)
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    };

    html! {
        form
            hx-put=(endpoints::PROFILE_API)
            hx-target-error="#alert-container"
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            class="w-full space-y-4 md:space-y-6"
        {
            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            (optional_input("first_name", "First Name", &form.first_name))
            (optional_input("last_name", "Last Name", &form.last_name))

            div
            {
                label for="email" class=(FORM_LABEL_STYLE) { "Email" }
                input
                    type="email"
                    name="email"
                    id="email"
                    value=(form.email)
                    autocomplete="email"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="currency" class=(FORM_LABEL_STYLE) { "Currency Symbol" }
                input
                    type="text"
                    name="currency"
                    id="currency"
                    value=(form.currency)
                    maxlength=(MAX_CURRENCY_LENGTH)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (submit_button("Save Profile"))
        }
    }
}

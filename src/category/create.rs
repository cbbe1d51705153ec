//! Category creation page and endpoint.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error,
    auth::UserID,
    category::{
        create_category,
        domain::CategoryFormData,
        form::{CategoryState, category_form_page, category_form_view},
    },
    endpoints,
    html::{base, dark_mode_script},
    profile::get_or_create_profile,
};

/// Render the category creation page.
pub async fn get_new_category_page(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let profile = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_or_create_profile(user_id, &connection)?
    };

    let form = category_form_view(
        endpoints::CATEGORIES_API,
        "hx-post",
        &CategoryFormData::default(),
        None,
    );
    let content = category_form_page("New Category", form);

    Ok(base("New Category", &[dark_mode_script(profile.dark_mode)], &content).into_response())
}

/// Handle category creation form submission.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<CategoryFormData>,
) -> Response {
    let new_category = match form.validate() {
        Ok(new_category) => new_category,
        Err(error) => {
            return category_form_view(
                endpoints::CATEGORIES_API,
                "hx-post",
                &form,
                Some(&format!("Error: {error}")),
            )
            .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(user_id, new_category, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");

            error.into_alert_response()
        }
    }
}

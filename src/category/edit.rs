//! Category editing page and endpoint.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error,
    auth::UserID,
    category::{
        CategoryId,
        domain::CategoryFormData,
        form::{CategoryState, category_form_page, category_form_view},
        get_category, update_category,
    },
    endpoints::{self, format_endpoint},
    html::{base, dark_mode_script},
    profile::get_or_create_profile,
};

/// Render the page for editing a category.
pub async fn get_edit_category_page(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = get_category(category_id, user_id, &connection)?;
    let profile = get_or_create_profile(user_id, &connection)?;

    let form = category_form_view(
        &format_endpoint(endpoints::CATEGORY_API, category_id),
        "hx-put",
        &CategoryFormData::from_category(&category),
        None,
    );
    let content = category_form_page("Edit Category", form);

    Ok(base("Edit Category", &[dark_mode_script(profile.dark_mode)], &content).into_response())
}

/// Handle the category edit form submission.
pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
    Form(form): Form<CategoryFormData>,
) -> Response {
    let endpoint = format_endpoint(endpoints::CATEGORY_API, category_id);

    let category = match form.validate() {
        Ok(category) => category,
        Err(error) => {
            return category_form_view(&endpoint, "hx-put", &form, Some(&format!("Error: {error}")))
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

    match update_category(category_id, user_id, category, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not update category {category_id}: {error}");
            error.into_alert_response()
        }
    }
}

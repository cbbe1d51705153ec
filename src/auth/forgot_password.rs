//! The page explaining how to reset a forgotten password.

use axum::response::{IntoResponse, Response};
use maud::html;

use crate::{
    endpoints,
    html::{base, link, log_in_register},
};

/// Renders a page describing how an administrator can reset the user's password.
pub async fn get_forgot_password_page() -> Response {
    let content = html! {
        p class="text-justify text-gray-900 dark:text-white"
        {
            "Passwords are reset by the administrator of this server. Ask them to run "
            code { "reset_password --db-path <database file> --username <your username>" }
            " from the directory the server runs in, then log in with the new password."
        }

        p class="text-sm font-light text-gray-500 dark:text-gray-400"
        {
            "Remembered it? "
            (link(endpoints::LOG_IN_VIEW, "Log in here"))
        }
    };

    base(
        "Forgot Password",
        &[],
        &log_in_register("Forgot your password?", &content),
    )
    .into_response()
}

//! User accounts and cookie based authentication.
//!
//! The auth cookie holds an encrypted token naming the logged in user.
//! [auth_guard] and [auth_guard_hx] check the cookie on every protected route
//! and hand the [UserID] to the route handlers as a request extension.

mod cookie;
mod forgot_password;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register;
mod token;
pub(crate) mod user;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub use forgot_password::get_forgot_password_page;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::{get_register_page, register_user};
pub use user::{
    NewUser, User, UserID, create_user, create_user_table, delete_user, get_user_by_id,
    get_user_by_username, update_password, update_user_details,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

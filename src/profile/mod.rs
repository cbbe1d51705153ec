//! User profiles: display settings such as the currency symbol and dark mode.

mod db;
mod page;

pub use db::{
    DEFAULT_CURRENCY, Profile, create_profile_table, get_or_create_profile, update_currency,
};
pub use page::{get_profile_page, toggle_dark_mode_endpoint, update_profile_endpoint};

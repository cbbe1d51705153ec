//! Categories group a user's expenses and income, e.g. 'Groceries' or 'Salary'.
//!
//! Each category is owned by one user and declares whether it may be used
//! for expenses, income or both. New users start with a catalog of default
//! categories.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;
mod seed;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::{
    count_transactions_per_category, create_category, create_category_table, delete_category,
    get_categories, get_categories_for_kind, get_category, update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{
    Category, CategoryId, CategoryName, CategoryType, Color, DEFAULT_ICON, NewCategory,
};
pub use edit::{get_edit_category_page, update_category_endpoint};
pub use list::get_categories_page;
pub use seed::{CategoryTemplate, DEFAULT_CATEGORIES, seed_default_categories};

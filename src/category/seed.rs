//! The default categories every new user starts with.

use std::collections::HashSet;

use crate::{
    Error,
    auth::UserID,
    category::{CategoryName, CategoryType, Color, NewCategory},
    store::LedgerStore,
};

/// The fields of a default category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryTemplate {
    pub name: &'static str,
    pub category_type: CategoryType,
    /// A Bootstrap icon class name.
    pub icon: &'static str,
    /// A hex color such as "#e74c3c".
    pub color: &'static str,
}

impl CategoryTemplate {
    const fn new(
        name: &'static str,
        category_type: CategoryType,
        icon: &'static str,
        color: &'static str,
    ) -> Self {
        Self {
            name,
            category_type,
            icon,
            color,
        }
    }

    fn to_new_category(self) -> NewCategory {
        NewCategory {
            name: CategoryName::new_unchecked(self.name),
            category_type: self.category_type,
            icon: self.icon.to_owned(),
            color: Color::new_unchecked(self.color),
            is_default: true,
        }
    }
}

/// The categories created for every new user.
pub const DEFAULT_CATEGORIES: [CategoryTemplate; 12] = [
    CategoryTemplate::new("Food & Dining", CategoryType::Expense, "bi-cup-hot", "#e74c3c"),
    CategoryTemplate::new("Transportation", CategoryType::Expense, "bi-car-front", "#3498db"),
    CategoryTemplate::new("Shopping", CategoryType::Expense, "bi-bag", "#9b59b6"),
    CategoryTemplate::new("Entertainment", CategoryType::Expense, "bi-controller", "#e67e22"),
    CategoryTemplate::new("Healthcare", CategoryType::Expense, "bi-heart-pulse", "#1abc9c"),
    CategoryTemplate::new("Utilities", CategoryType::Expense, "bi-lightning", "#f1c40f"),
    CategoryTemplate::new("Housing", CategoryType::Expense, "bi-house", "#e91e63"),
    CategoryTemplate::new("Education", CategoryType::Expense, "bi-book", "#00bcd4"),
    CategoryTemplate::new("Salary", CategoryType::Income, "bi-cash-stack", "#27ae60"),
    CategoryTemplate::new("Freelance", CategoryType::Income, "bi-laptop", "#2980b9"),
    CategoryTemplate::new("Investment", CategoryType::Income, "bi-graph-up-arrow", "#8e44ad"),
    CategoryTemplate::new("Other Income", CategoryType::Income, "bi-plus-circle", "#16a085"),
];

/// Give `user_id` each default category whose name they do not have yet.
///
/// Existing categories are never changed, so calling this again only adds
/// defaults that were renamed or deleted in the meantime.
///
/// Returns the number of categories created.
///
/// # Errors
/// Returns an error if the store could not be read or written.
pub fn seed_default_categories(store: &impl LedgerStore, user_id: UserID) -> Result<usize, Error> {
    let existing: HashSet<String> = store.category_names(user_id)?.into_iter().collect();
    let mut created = 0;

    for template in DEFAULT_CATEGORIES {
        if existing.contains(template.name) {
            continue;
        }

        store.insert_category(user_id, template.to_new_category())?;
        created += 1;
    }

    if created > 0 {
        tracing::debug!("Created {created} default categories for user {user_id}");
    }

    Ok(created)
}

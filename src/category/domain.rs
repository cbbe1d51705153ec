//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::UserID, transaction::TransactionKind};

/// Database identifier for a category.
pub type CategoryId = i64;

/// The icon used for categories created without one.
pub const DEFAULT_ICON: &str = "bi-tag";

/// The kinds of transaction a category may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    /// Only expenses.
    #[default]
    Expense,
    /// Only income.
    Income,
    /// Both expenses and income.
    Both,
}

impl CategoryType {
    /// All category types, in the order they are shown in forms.
    pub const ALL: [CategoryType; 3] = [
        CategoryType::Expense,
        CategoryType::Income,
        CategoryType::Both,
    ];

    /// The value stored in the database and sent by forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Expense => "expense",
            CategoryType::Income => "income",
            CategoryType::Both => "both",
        }
    }

    /// A human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            CategoryType::Expense => "Expense",
            CategoryType::Income => "Income",
            CategoryType::Both => "Both",
        }
    }

    /// Whether a category of this type may be used for transactions of `kind`.
    pub fn allows(&self, kind: TransactionKind) -> bool {
        matches!(
            (self, kind),
            (CategoryType::Both, _)
                | (CategoryType::Expense, TransactionKind::Expense)
                | (CategoryType::Income, TransactionKind::Income)
        )
    }
}

impl FromStr for CategoryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(CategoryType::Expense),
            "income" => Ok(CategoryType::Income),
            "both" => Ok(CategoryType::Both),
            _ => Err(Error::InvalidCategoryType(s.to_owned())),
        }
    }
}

impl Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for CategoryType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        text.parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A validated category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// The maximum number of characters in a category name.
    pub const MAX_LENGTH: usize = 100;

    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is
    /// empty or whitespace, or an [Error::CategoryNameTooLong] if it has more
    /// than [CategoryName::MAX_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else if name.chars().count() > Self::MAX_LENGTH {
            Err(Error::CategoryNameTooLong(Self::MAX_LENGTH))
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A hex color such as "#6c757d", stored in lowercase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Color(String);

impl Color {
    /// The gray used for new categories and uncategorized totals.
    pub const DEFAULT: &'static str = "#6c757d";

    /// Parse a color in the form "#rrggbb".
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidColor] if `color` is not a six digit hex color.
    pub fn new(color: &str) -> Result<Self, Error> {
        let color = color.trim();

        match color.strip_prefix('#') {
            Some(hex) if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
                Ok(Self(color.to_ascii_lowercase()))
            }
            _ => Err(Error::InvalidColor(color.to_owned())),
        }
    }

    /// Wrap a color read from the database without validation.
    pub fn new_unchecked(color: &str) -> Self {
        Self(color.to_owned())
    }
}

impl Default for Color {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl AsRef<str> for Color {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user defined label for grouping expenses and income, e.g. 'Groceries'.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub user_id: UserID,
    pub name: CategoryName,
    pub category_type: CategoryType,
    /// A Bootstrap icon class name, e.g. "bi-cart".
    pub icon: String,
    pub color: Color,
    /// Whether the category was created from the default catalog.
    pub is_default: bool,
    pub created_at: OffsetDateTime,
}

/// The data needed to create a category.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: CategoryName,
    pub category_type: CategoryType,
    pub icon: String,
    pub color: Color,
    pub is_default: bool,
}

impl NewCategory {
    /// A non-default category with the default icon and color.
    pub fn new(name: CategoryName, category_type: CategoryType) -> Self {
        Self {
            name,
            category_type,
            icon: DEFAULT_ICON.to_owned(),
            color: Color::default(),
            is_default: false,
        }
    }
}

/// Form data for category creation and editing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryFormData {
    pub name: String,
    pub category_type: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl CategoryFormData {
    /// The form filled in with an existing category.
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.to_string(),
            category_type: category.category_type.as_str().to_owned(),
            icon: Some(category.icon.clone()),
            color: Some(category.color.to_string()),
        }
    }

    /// Validate the form into the fields of a category.
    pub(super) fn validate(&self) -> Result<NewCategory, Error> {
        let name = CategoryName::new(&self.name)?;
        let category_type = self.category_type.parse()?;
        let icon = match self.icon.as_deref().map(str::trim) {
            Some(icon) if !icon.is_empty() => icon.to_owned(),
            _ => DEFAULT_ICON.to_owned(),
        };
        let color = match self.color.as_deref().map(str::trim) {
            Some(color) if !color.is_empty() => Color::new(color)?,
            _ => Color::default(),
        };

        Ok(NewCategory {
            name,
            category_type,
            icon,
            color,
            is_default: false,
        })
    }
}


#[cfg(test)]
mod category_type_tests {
    use crate::{Error, category::CategoryType, transaction::TransactionKind};

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Income".parse(), Ok(CategoryType::Income));
        assert_eq!("BOTH".parse(), Ok(CategoryType::Both));
    }

    #[test]
    fn rejects_unknown_type() {
        assert_eq!(
            "transfer".parse::<CategoryType>(),
            Err(Error::InvalidCategoryType("transfer".to_owned()))
        );
    }

    #[test]
    fn allows_matching_kinds() {
        assert!(CategoryType::Expense.allows(TransactionKind::Expense));
        assert!(!CategoryType::Expense.allows(TransactionKind::Income));
        assert!(CategoryType::Income.allows(TransactionKind::Income));
        assert!(!CategoryType::Income.allows(TransactionKind::Expense));
        assert!(CategoryType::Both.allows(TransactionKind::Expense));
        assert!(CategoryType::Both.allows(TransactionKind::Income));
    }
}

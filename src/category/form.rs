//! The form shared by the pages for creating and editing categories.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, endpoints,
    category::{CategoryName, CategoryType, Color, DEFAULT_ICON, domain::CategoryFormData},
    html::{
        FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, submit_button,
    },
    navigation::NavBar,
};

/// The state needed by the category pages and endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the category form that sends `hx_method` ("hx-post" or "hx-put")
/// to `endpoint`.
pub(super) fn category_form_view(
    endpoint: &str,
    hx_method: &str,
    form: &CategoryFormData,
    error_message: Option<&str>,
) -> Markup {
    let submit_text = if hx_method == "hx-put" {
        "Update Category"
    } else {
        "Create Category"
    };
    let selected_type = form
        .category_type
        .parse::<CategoryType>()
        .unwrap_or_default();
    let icon = form
        .icon
        .as_deref()
        .filter(|icon| !icon.trim().is_empty())
        .unwrap_or(DEFAULT_ICON);
    let color = form
        .color
        .as_deref()
        .filter(|color| !color.trim().is_empty())
        .unwrap_or(Color::DEFAULT);

    html! {
        form
            hx-post=[(hx_method == "hx-post").then_some(endpoint)]
            hx-put=[(hx_method == "hx-put").then_some(endpoint)]
            hx-target-error="#alert-container"
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            class="w-full space-y-4 md:space-y-6"
        {
            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Category Name"
                    value=(form.name)
                    maxlength=(CategoryName::MAX_LENGTH)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category_type" class=(FORM_LABEL_STYLE) { "Used for" }

                select name="category_type" id="category_type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for category_type in CategoryType::ALL {
                        option
                            value=(category_type.as_str())
                            selected[category_type == selected_type]
                        {
                            (category_type.label())
                        }
                    }
                }
            }

            div
            {
                label for="icon" class=(FORM_LABEL_STYLE) { "Icon" }

                input
                    id="icon"
                    type="text"
                    name="icon"
                    placeholder=(DEFAULT_ICON)
                    value=(icon)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="color" class=(FORM_LABEL_STYLE) { "Color" }

                input
                    id="color"
                    type="color"
                    name="color"
                    value=(color)
                    class="h-10 w-20 rounded cursor-pointer";
            }

            (submit_button(submit_text))
        }
    }
}

/// The page around a category form.
pub(super) fn category_form_page(heading: &str, form: Markup) -> Markup {
    html! {
        (NavBar::new(endpoints::CATEGORIES_VIEW).into_html())

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h1 class="text-xl font-bold" { (heading) }

                (form)

                a href=(endpoints::CATEGORIES_VIEW) class=(LINK_STYLE) { "Back to categories" }
            }
        }
    }
}

#[cfg(test)]
mod category_form_tests {
    use scraper::{Html, Selector};

    use crate::{
        Error,
        category::{CategoryType, Color, DEFAULT_ICON, domain::CategoryFormData},
    };

    use super::category_form_view;

    fn form_data(category_type: &str, color: Option<&str>) -> CategoryFormData {
        CategoryFormData {
            name: " Groceries ".to_owned(),
            category_type: category_type.to_owned(),
            icon: Some(String::new()),
            color: color.map(str::to_owned),
        }
    }

    #[test]
    fn validate_fills_in_defaults() {
        let category = form_data("both", Some("")).validate().unwrap();

        assert_eq!(category.name.as_ref(), "Groceries");
        assert_eq!(category.category_type, CategoryType::Both);
        assert_eq!(category.icon, DEFAULT_ICON);
        assert_eq!(category.color, Color::default());
        assert!(!category.is_default);
    }

    #[test]
    fn validate_rejects_bad_type_and_color() {
        assert_eq!(
            form_data("savings", None).validate().err(),
            Some(Error::InvalidCategoryType("savings".to_owned()))
        );
        assert_eq!(
            form_data("expense", Some("red")).validate().err(),
            Some(Error::InvalidColor("red".to_owned()))
        );
    }

    #[test]
    fn selects_current_type() {
        let markup = category_form_view(
            "/api/categories/1",
            "hx-put",
            &form_data("income", Some("#27ae60")),
            None,
        );
        let html = Html::parse_fragment(&markup.into_string());

        let selected: Vec<String> = html
            .select(&Selector::parse("option[selected]").unwrap())
            .map(|option| option.value().attr("value").unwrap_or_default().to_owned())
            .collect();
        assert_eq!(selected, ["income"]);
        let color = html
            .select(&Selector::parse("input[name=color]").unwrap())
            .next()
            .unwrap();
        assert_eq!(color.value().attr("value"), Some("#27ae60"));
    }
}

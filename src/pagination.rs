//! This modules defines the common functionality for paging data.

use maud::{Markup, html};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum number of rows to display per page.
    pub default_page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
            max_pages: 5,
        }
    }
}

impl PaginationConfig {
    /// A config with `page_size` rows per page and the default for everything else.
    pub fn with_page_size(page_size: u64) -> Self {
        Self {
            default_page_size: page_size.max(1),
            ..Default::default()
        }
    }
}

/// The number of pages needed to show `row_count` rows, at least one.
pub fn page_count(row_count: u64, page_size: u64) -> u64 {
    row_count.div_ceil(page_size.max(1)).max(1)
}

/// The rows of `rows` on page `page` (starting from 1), clamped to the last page.
pub fn page_slice<T>(rows: &[T], page: u64, page_size: u64) -> (&[T], u64) {
    let page_size = page_size.max(1);
    let page = page.clamp(1, page_count(rows.len() as u64, page_size));
    let start = ((page - 1) * page_size) as usize;
    let end = (start + page_size as usize).min(rows.len());

    (&rows[start.min(rows.len())..end], page)
}

#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let map_page = |page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let mut indicators: Vec<PaginationIndicator> = if page_count <= max_pages {
        (1..=page_count).map(map_page).collect()
    } else if curr_page <= (max_pages / 2) {
        (1..=max_pages).map(map_page).collect()
    } else if curr_page > (page_count - max_pages / 2) {
        ((page_count - max_pages + 1)..=page_count)
            .map(map_page)
            .collect()
    } else {
        ((curr_page - max_pages / 2)..=(curr_page + max_pages / 2))
            .map(map_page)
            .collect()
    };

    if page_count > max_pages {
        if curr_page > (max_pages / 2) + 1 {
            indicators.insert(0, PaginationIndicator::Page(1));
            indicators.insert(1, PaginationIndicator::Ellipsis);
        }

        if curr_page < (page_count - max_pages / 2) {
            indicators.push(PaginationIndicator::Ellipsis);
            indicators.push(PaginationIndicator::Page(page_count));
        }
    }

    if curr_page > 1 {
        indicators.insert(0, PaginationIndicator::BackButton(curr_page - 1));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

const PAGE_LINK_STYLE: &str = "block px-3 py-2 leading-tight text-gray-500 bg-white \
    border border-gray-300 hover:bg-gray-100 hover:text-gray-700 dark:bg-gray-800 \
    dark:border-gray-700 dark:text-gray-400 dark:hover:bg-gray-700 dark:hover:text-white";
const CURRENT_PAGE_STYLE: &str = "block px-3 py-2 leading-tight text-blue-600 \
    border border-blue-300 bg-blue-50 dark:border-gray-700 dark:bg-gray-700 dark:text-white";

/// Renders the pagination indicators as links, where `page_url` gives the
/// link for a page number.
///
/// Nothing is rendered when there is only one page.
pub fn pagination_view(
    indicators: &[PaginationIndicator],
    page_url: impl Fn(u64) -> String,
) -> Markup {
    if indicators.len() <= 1 {
        return html! {};
    }

    html! {
        nav class="pagination flex justify-center my-4" aria-label="Pagination"
        {
            ul class="pagination inline-flex -space-x-px text-sm"
            {
                @for indicator in indicators {
                    li
                    {
                        @match indicator {
                            PaginationIndicator::Page(page) => {
                                a href=(page_url(*page)) class=(PAGE_LINK_STYLE) { (page) }
                            }
                            PaginationIndicator::CurrPage(page) => {
                                span aria-current="page" class=(CURRENT_PAGE_STYLE) { (page) }
                            }
                            PaginationIndicator::Ellipsis => {
                                span class=(PAGE_LINK_STYLE) { "..." }
                            }
                            PaginationIndicator::BackButton(page) => {
                                a href=(page_url(*page)) class=(PAGE_LINK_STYLE) { "Back" }
                            }
                            PaginationIndicator::NextButton(page) => {
                                a href=(page_url(*page)) class=(PAGE_LINK_STYLE) { "Next" }
                            }
                        }
                    }
                }
            }
        }
    }
}

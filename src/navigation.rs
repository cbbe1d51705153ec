//! The navigation bar shown at the top of every signed-in page, with a
//! bottom bar on small screens.

use maud::{Markup, html};

use crate::endpoints;

/// Where a link shows up on small screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Always visible in the bottom bar.
    BottomBar,
    /// Tucked away in the "More" menu.
    MoreMenu,
}

const LINKS: [(&str, &str, Placement); 6] = [
    (endpoints::DASHBOARD_VIEW, "Dashboard", Placement::BottomBar),
    (endpoints::EXPENSES_VIEW, "Expenses", Placement::BottomBar),
    (endpoints::INCOME_VIEW, "Income", Placement::BottomBar),
    (endpoints::CATEGORIES_VIEW, "Categories", Placement::MoreMenu),
    (endpoints::PROFILE_VIEW, "Profile", Placement::MoreMenu),
    (endpoints::LOG_OUT, "Log out", Placement::MoreMenu),
];

#[derive(Debug, Clone, Copy)]
struct Link {
    url: &'static str,
    title: &'static str,
    placement: Placement,
    is_current: bool,
}

const DESKTOP_CURRENT_STYLE: &str = "block py-2 px-3 text-white bg-blue-700 rounded-sm \
    lg:bg-transparent lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500";
const DESKTOP_STYLE: &str = "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100 \
    lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0 dark:text-white \
    lg:dark:hover:text-blue-500 dark:hover:bg-gray-700 dark:hover:text-white \
    lg:dark:hover:bg-transparent";

const BOTTOM_ITEM_STYLE: &str = "flex w-full min-w-0 items-center justify-center rounded-lg \
    px-2.5 py-2 text-xs font-semibold leading-tight sm:px-4 sm:text-sm cursor-pointer";
const BOTTOM_CURRENT_STYLE: &str =
    "bg-blue-50 text-blue-700 shadow-sm dark:bg-blue-900/30 dark:text-blue-200";
const BOTTOM_STYLE: &str = "text-gray-600 hover:bg-blue-50/70 hover:text-blue-700 \
    dark:text-gray-300 dark:hover:bg-blue-900/20 dark:hover:text-blue-200";

const MORE_ITEM_STYLE: &str = "block w-full text-left rounded-lg px-3 py-2";
const MORE_CURRENT_STYLE: &str = "bg-blue-50 text-blue-700 dark:bg-blue-900/30 dark:text-blue-200";
const MORE_STYLE: &str = "text-gray-700 hover:bg-gray-100 hover:text-blue-700 \
    dark:text-gray-200 dark:hover:bg-gray-800/80 dark:hover:text-blue-200";

fn bottom_item_style(is_current: bool) -> String {
    let state = if is_current {
        BOTTOM_CURRENT_STYLE
    } else {
        BOTTOM_STYLE
    };

    format!("{BOTTOM_ITEM_STYLE} {state}")
}

fn more_item_style(is_current: bool) -> String {
    let state = if is_current {
        MORE_CURRENT_STYLE
    } else {
        MORE_STYLE
    };

    format!("{MORE_ITEM_STYLE} {state}")
}

/// Posts to the dark mode endpoint and applies the returned setting.
fn dark_mode_toggle(class: &str) -> Markup {
    html! {
        button
            type="button"
            hx-post=(endpoints::DARK_MODE_API)
            hx-swap="none"
            hx-on:htmx:after-request="if (event.detail.successful) applyDarkMode(JSON.parse(event.detail.xhr.responseText).dark_mode)"
            aria-label="Toggle dark mode"
            class=(class)
        {
            "Toggle theme"
        }
    }
}

pub struct NavBar {
    links: Vec<Link>,
}

impl NavBar {
    /// The navigation bar with the link for `active_endpoint`, if any, highlighted.
    ///
    /// Log out is never highlighted.
    pub fn new(active_endpoint: &str) -> Self {
        let links = LINKS
            .iter()
            .map(|&(url, title, placement)| Link {
                url,
                title,
                placement,
                is_current: url == active_endpoint && url != endpoints::LOG_OUT,
            })
            .collect();

        Self { links }
    }

    fn links_in(&self, placement: Placement) -> impl Iterator<Item = &Link> {
        self.links
            .iter()
            .filter(move |link| link.placement == placement)
    }

    fn desktop_html(&self) -> Markup {
        // Layout adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html! {
            nav class="bg-white border-gray-200 dark:bg-gray-900" {
                div class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4" {
                    a href=(endpoints::ROOT) class="flex items-center space-x-3 rtl:space-x-reverse" {
                        img src="/static/favicon-128x128.png" alt="Finance Tracker Logo" class="h-8";
                        span class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white" {
                            "Finance Tracker"
                        }
                    }

                    div class="hidden w-full lg:flex lg:items-center lg:gap-8 lg:w-auto" {
                        ul class="font-medium flex flex-col p-4 lg:p-0 mt-4 border border-gray-100 \
                            rounded bg-gray-50 lg:flex-row lg:space-x-8 rtl:space-x-reverse lg:mt-0 \
                            lg:border-0 lg:bg-white dark:bg-gray-800 lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for link in &self.links {
                                li {
                                    a
                                        href=(link.url)
                                        class=(if link.is_current { DESKTOP_CURRENT_STYLE } else { DESKTOP_STYLE })
                                        aria-current=[link.is_current.then_some("page")]
                                    { (link.title) }
                                }
                            }
                        }

                        (dark_mode_toggle("text-sm text-gray-600 hover:text-blue-700 dark:text-gray-300 dark:hover:text-blue-400"))
                    }
                }
            }
        }
    }

    fn mobile_html(&self) -> Markup {
        let more_is_current = self.links_in(Placement::MoreMenu).any(|link| link.is_current);

        html! {
            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden" {
                div class="mx-auto max-w-screen-xl px-4 pb-4" {
                    div class="rounded-xl border border-gray-200 bg-white/95 shadow-lg backdrop-blur \
                        dark:border-gray-700 dark:bg-gray-900/95"
                    {
                        ul class="grid grid-cols-4 gap-2 px-4 py-3" aria-label="Primary" {
                            @for link in self.links_in(Placement::BottomBar) {
                                li class="min-w-0" {
                                    a
                                        href=(link.url)
                                        class=(bottom_item_style(link.is_current))
                                        aria-current=[link.is_current.then_some("page")]
                                    {
                                        span class="truncate" { (link.title) }
                                    }
                                }
                            }

                            li class="min-w-0" {
                                details class="group relative" {
                                    summary
                                        class={ "list-none [&::-webkit-details-marker]:hidden " (bottom_item_style(more_is_current)) }
                                    {
                                        span class="truncate" { "More" }
                                    }

                                    div class="absolute bottom-full right-0 mb-3 w-40 rounded-xl border \
                                        border-gray-200 bg-white/95 p-2 shadow-xl backdrop-blur \
                                        dark:border-gray-700 dark:bg-gray-900/95"
                                    {
                                        ul class="flex flex-col gap-1 text-sm font-medium" {
                                            @for link in self.links_in(Placement::MoreMenu) {
                                                li {
                                                    a
                                                        href=(link.url)
                                                        class=(more_item_style(link.is_current))
                                                        aria-current=[link.is_current.then_some("page")]
                                                    { (link.title) }
                                                }
                                            }

                                            li { (dark_mode_toggle(&more_item_style(false))) }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    pub fn into_html(self) -> Markup {
        html! {
            (self.desktop_html())
            (self.mobile_html())
        }
    }
}

use axum::{body::Body, response::Response};
use scraper::{Html, Selector};

async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not get response body");

    String::from_utf8_lossy(&body).into_owned()
}

pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&body_text(response).await)
}

pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&body_text(response).await)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}

/// The trimmed text of the first `columns` cells of each body row of the first table.
#[track_caller]
pub(crate) fn table_rows(html: &Html, columns: usize) -> Vec<Vec<String>> {
    let row_selector = Selector::parse("table tbody tr").expect("Invalid row selector");
    let cell_selector = Selector::parse("td").expect("Invalid cell selector");

    html.select(&row_selector)
        .map(|row| {
            row.select(&cell_selector)
                .take(columns)
                .map(|cell| cell.text().collect::<String>().trim().to_owned())
                .collect()
        })
        .collect()
}

//! Fixtures and assertions shared by the unit tests.
#![allow(missing_docs)]

pub(crate) mod db;
pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use db::{
    create_test_category, create_test_transaction, create_test_user, get_test_connection,
    get_test_connection_with_user,
};
pub(crate) use form::{
    assert_form_error_message, assert_form_input, assert_form_input_with_value,
    assert_form_submit_button, assert_hx_endpoint, must_get_form, select_options,
};
pub(crate) use html::{assert_valid_html, parse_html_document, parse_html_fragment, table_rows};
pub(crate) use http::{assert_content_type, assert_hx_redirect, assert_status_ok, get_header};

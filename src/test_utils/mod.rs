#![allow(missing_docs)]

pub(crate) mod db;
pub(crate) mod form;
pub(crate) mod response;

pub(crate) use db::{create_named_test_user, create_test_user, get_test_connection};
pub(crate) use form::{
    assert_form_error_message, assert_form_input, assert_form_input_with_value,
    assert_form_submit_button, assert_hx_endpoint, assert_optional_form_input, must_get_form,
};
pub(crate) use response::{
    assert_content_type, assert_hx_redirect, assert_valid_html, get_header, parse_html_document,
    parse_html_fragment, response_json, response_text,
};

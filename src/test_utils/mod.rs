#![allow(missing_docs)]

pub(crate) mod http;
pub(crate) mod state;

pub(crate) use http::assert_json_error;
pub(crate) use state::{create_test_user, get_test_state, log_in_test_user};

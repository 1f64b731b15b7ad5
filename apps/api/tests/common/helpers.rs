//! Test helper functions for API integration tests

#![allow(dead_code)]

use sensorapi_api::ServiceError;

/// Assert that a result contains a specific error message substring
#[macro_export]
macro_rules! assert_err_contains {
    ($result:expr, $substr:expr) => {
        match &$result {
            Ok(_) => panic!("Expected error but got Ok"),
            Err(e) => {
                let msg = e.to_string();
                assert!(
                    msg.contains($substr),
                    "Error message '{}' does not contain '{}'",
                    msg,
                    $substr
                );
            }
        }
    };
}

/// Error code of a failed service call, for compact assertions
pub fn error_code<T: std::fmt::Debug>(result: &Result<T, ServiceError>) -> &'static str {
    match result {
        Ok(value) => panic!("Expected error but got Ok({:?})", value),
        Err(err) => err.error_code(),
    }
}

#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]

mod unit {
    mod config_tests;
    mod credential_loading_tests;
    mod error_tests;
    mod snapshot_pipeline_tests;
}

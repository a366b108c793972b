//! Integration tests for breakclock acceptance testing.

mod activation_test;
mod auto_start_test;
mod common;
mod config_test;
mod pause_detection_test;

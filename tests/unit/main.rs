mod config_tests;
mod jwt;
mod key_tests;

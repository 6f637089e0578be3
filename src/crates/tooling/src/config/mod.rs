//! Configuration helpers.

pub mod env;

pub use env::{get_env, get_env_or, get_env_parse, get_env_parse_or};

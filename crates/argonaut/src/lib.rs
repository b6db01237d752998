pub mod app;
pub mod cli;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod logging;
pub mod runtime;
pub mod ui;

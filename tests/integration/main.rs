// tests/integration/main.rs

#[path = "../common/mod.rs"]
mod common;

mod atomicity;
mod cascade;
mod cli_run;
mod config_loading;
mod contention;
mod gating;
mod history;

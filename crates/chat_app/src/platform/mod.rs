mod app;
mod commands;
mod ui;

pub use app::run_app;

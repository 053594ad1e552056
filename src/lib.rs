pub mod app;
pub mod auth;
pub mod cli;
pub mod logging;
pub mod page;
pub mod realm;
pub mod settings;
pub mod store;
pub mod theme;
pub mod types;
pub mod ui;

pub mod app_setup;
pub mod settings;
pub mod window_config;

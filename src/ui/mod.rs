pub mod app;
pub mod commands;
pub mod refresh;
pub mod render;

pub mod app;
mod commands;
mod config;
mod dispatch;
mod env;
mod plan;
mod runtime;

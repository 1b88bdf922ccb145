pub mod apply;
pub mod commands;
pub mod config;
pub mod console;
pub mod diff;
pub mod discovery;
pub mod error;
pub mod http;
pub mod index;
pub mod requirements;
pub mod runtime;

pub mod api;
pub mod config;
pub mod countdown;
pub mod humanize;
pub mod observability;
pub mod upstream;

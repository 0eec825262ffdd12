//! HTTP request handlers, grouped by resource.

pub mod hardware;
pub mod project;

pub mod api;
pub mod headers;

//! HTTP front end for the hlsmith transcoding service.

pub mod api;
pub mod metrics;
pub mod state;

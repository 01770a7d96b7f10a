//! HTTP transport for the image-description research platform core
//! (SPEC_FULL.md §4.10–§4.13). The `imagedesc-server` binary is a thin
//! wrapper around [`routes::build_router`]; integration tests build the
//! same router directly.

pub mod error_response;
pub mod middleware;
pub mod net;
pub mod routes;
pub mod state;

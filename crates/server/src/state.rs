//! Axum wiring for the `Core` context (SPEC_FULL.md §9 "explicit Core context").

use std::sync::Arc;

use imagedesc_core::Core;

pub type AppState = Arc<Core>;

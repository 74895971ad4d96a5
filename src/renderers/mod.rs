// Copyright @yucwang 2026

pub(crate) mod pass;
pub mod render_context;
pub mod render_manager;
pub mod render_worker;

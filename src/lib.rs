//! Olive of Wholeness - site server for a faith-based counseling ministry
//!
//! Public pages, an admin area and an analytics summary, with all data,
//! authentication and file storage held by a managed backend.

pub mod api;
pub mod backend;
pub mod config;
pub mod models;
pub mod services;
pub mod theme;

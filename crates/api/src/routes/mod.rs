//! HTTP route handlers

pub mod alerts;

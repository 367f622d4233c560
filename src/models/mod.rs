//! Configuration and startup models shared across the panel.

pub mod config;

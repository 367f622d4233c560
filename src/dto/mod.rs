//! Data transfer objects handed to the view renderer.

pub mod render;

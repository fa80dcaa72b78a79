//! Windowing-system event translation.

pub mod winit;

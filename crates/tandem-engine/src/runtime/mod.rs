//! UI thread runtime.
//!
//! Owns the single designated thread on which every surface is created,
//! attached and destroyed. Other threads reach it by posting tasks through a
//! [`UiHandle`].

mod ui_loop;

pub use ui_loop::{UiClosed, UiCtx, UiHandle, UiLoop};

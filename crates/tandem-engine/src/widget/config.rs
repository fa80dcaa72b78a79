use std::time::Duration;

use crate::device::SurfaceConfig;

/// Application-level configuration of one embedded widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    /// Used in logs and as the default init thread name suffix.
    pub name: String,
    pub continuous_rendering: bool,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
    pub depth: u8,
    pub stencil: u8,
    pub samples: u8,
}

impl WidgetConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Surface configuration for a view of `width` x `height` pixels.
    pub fn surface_config(&self, width: u32, height: u32) -> SurfaceConfig {
        SurfaceConfig {
            width,
            height,
            continuous_rendering: self.continuous_rendering,
            r: self.r,
            g: self.g,
            b: self.b,
            a: self.a,
            depth: self.depth,
            stencil: self.stencil,
            samples: self.samples,
        }
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        let surface = SurfaceConfig::default();
        Self {
            name: "widget".to_string(),
            continuous_rendering: surface.continuous_rendering,
            r: surface.r,
            g: surface.g,
            b: surface.b,
            a: surface.a,
            depth: surface.depth,
            stencil: surface.stencil,
            samples: surface.samples,
        }
    }
}

/// Widget init thread settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerConfig {
    pub thread_name: String,
    /// Upper bound on the wait for the host context. `None` waits until
    /// interrupted.
    pub context_timeout: Option<Duration>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            thread_name: "widget-init".to_string(),
            context_timeout: None,
        }
    }
}

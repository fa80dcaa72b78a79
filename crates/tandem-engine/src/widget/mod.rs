//! Widget initialization and the widget render-thread work queue.

mod config;
mod runnables;
mod sequencer;

pub use config::{SequencerConfig, WidgetConfig};
pub use runnables::RunnableQueue;
pub use sequencer::{AbortReason, SequencerError, SequencerState, WidgetInitSequencer};

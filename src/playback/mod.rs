//! Playback clock and scroll control for the teleprompter view.

pub mod clock;
pub mod controller;
pub mod scroll;

pub use clock::{ExternalClock, PlaybackClock, PlaybackState};
pub use controller::{PrompterSettings, Teleprompter, TickFrame, Transport};
pub use scroll::{InputDisposition, ScrollCommand, ScrollObservation};

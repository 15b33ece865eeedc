//! External playback transports.

pub mod mpv;

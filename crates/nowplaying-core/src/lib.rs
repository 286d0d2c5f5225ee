#![cfg_attr(not(test), no_std)]

//! Platform-free logic for the now-playing desk display.

pub mod app;
pub mod artwork;
pub mod input;
pub mod playback;
pub mod progress;
pub mod provisioning;
pub mod render;
pub mod settings;
pub mod text_policy;
pub mod volume;

#[cfg(test)]
mod test_support;

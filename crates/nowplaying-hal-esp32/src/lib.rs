#![no_std]

//! ESP32 board glue for the now-playing display.

pub mod input;
pub mod network;
pub mod platform;
pub mod render;
pub mod storage;

//! Exporter for the textbook material of subjects on the onlineschool-1
//! student platform.

pub mod console;
pub mod export;
pub mod menu;
pub mod school;
pub mod secrets;

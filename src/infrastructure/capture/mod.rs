//! Audio capture adapters

mod cpal_capture;
pub mod wav;

pub use cpal_capture::CpalCapture;

//! Pocket Recorder - audio clip recorder with device status
//!
//! This crate records audio clips from the microphone into a managed
//! directory, lists, renames, plays and deletes them, watches battery,
//! free storage and location, and runs periodic background captures.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Core business logic, value objects, entities, and errors
//! - **Application**: Use cases and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, rodio, sysfs, HTTP, etc.)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

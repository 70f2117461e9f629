//! Core types and logic for touchtape.
//!
//! This crate holds the platform-independent half of the recorder: the
//! multi-touch protocol state machine that turns raw device events into
//! discrete touch lifecycle messages, and the replay scheduler that feeds
//! those messages back with their original pacing. Everything that touches
//! the operating system (device nodes, polling, the CLI) lives in the
//! `touchtape-cli` crate and reaches the core through the [`device`]
//! capability trait.
//!
//! # Modules
//!
//! - [`clock`]: millisecond timestamps relative to process start
//! - [`message`]: touch lifecycle messages and their text-line codec
//! - [`queue`]: pending-message buffering and the replay scheduler
//! - [`event`]: raw device event records and multi-touch protocol constants
//! - [`device`]: the capability contract a touch device provides
//! - [`panel`]: the per-slot multi-touch protocol state machine

pub mod clock;
pub mod device;
pub mod event;
pub mod message;
pub mod panel;
pub mod queue;

//! `pawdiary` - persistence core for a pet-health diary
//!
//! This crate provides the local storage layer behind a calendar-based pet
//! health diary: day cards keyed by calendar date, symptom records with
//! photo attachments, favorite-flagged gallery images, and the JSON schedule
//! snapshot consumed by a home-screen widget. UI layers issue intents
//! against the repositories in [`db`] and refresh themselves from the
//! change notifications published on [`notifications::NotificationBus`].

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    // Clippy categories for overall code quality
    clippy::all,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::float_cmp,

    // Complexity and readability
    clippy::cognitive_complexity,
    clippy::large_enum_variant,
    clippy::match_same_arms,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
)]

/// Configuration management for database and image-storage settings
pub mod config;
/// Repository layer - all read/write access to the record store
pub mod db;
/// Unified error types and result handling
pub mod errors;
/// Image-file manager capability for best-effort attachment cleanup
pub mod images;
/// Entity models - day cards, symptoms, and image attachments
pub mod models;
/// Typed publish/subscribe bus for day-card change notifications
pub mod notifications;
/// Shared schedule snapshot read by the home-screen widget process
pub mod widget;

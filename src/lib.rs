//! # Venn Layout
//!
//! An interactive Venn-style grouping canvas. Every item sits in its own
//! circle; dropping circles onto each other merges them into a containing
//! group, and pulling a circle far enough out of its group removes it again.
//!
//! ## Features
//! - Hierarchical circle grouping with automatic radius growth
//! - Fixed-rate physics that keeps siblings apart inside their group
//! - Highlighted intersections between nearly overlapping circles
//! - Canvas panning, wheel zoom and pinch zoom
//! - Viewport culling and per-frame render snapshots
//!
//! The layout engine ([`VennEngine`]) has no UI dependencies beyond egui's
//! geometry types and can be driven headlessly; [`run_app`] wraps it in an
//! eframe desktop window.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod drag;
pub mod engine;
pub mod geometry;
pub mod grouping;
pub mod highlight;
pub mod physics;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod viewport;
mod ui;

// Re-export the types most callers need
pub use config::LayoutConfig;
pub use drag::{DragOutcome, DragState, PointerId};
pub use engine::VennEngine;
pub use grouping::{CommitReport, Merge};
pub use highlight::IntersectionHighlight;
pub use snapshot::{ForestNode, RenderSnapshot};
pub use store::{EntityStore, ForestError};
pub use types::*;
pub use viewport::Viewport;
use ui::VennApp;

/// Runs the Venn layout application.
///
/// Preferences saved by a previous session are restored from eframe storage.
///
/// # Example
///
/// ```no_run
/// fn main() -> Result<(), eframe::Error> {
///     venn_layout::run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Venn Layout",
        options,
        Box::new(|cc| Ok(Box::new(VennApp::from_storage(cc.storage)))),
    )
}

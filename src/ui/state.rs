//! Application state management structures.
//!
//! The layout itself lives in the [`VennEngine`]; this module only tracks what
//! the desktop shell needs around it: pointer bookkeeping for the canvas and
//! the UI preferences that survive restarts.

use crate::config::LayoutConfig;
use crate::engine::VennEngine;
use crate::types::CircleId;
use eframe::egui;
use serde::{Deserialize, Serialize};

/// State related to user interactions with the canvas.
#[derive(Debug, Default)]
pub struct InteractionState {
    /// Circle grabbed by the primary button, if any
    pub held_circle: Option<CircleId>,
    /// Whether the current primary-button press is panning the view
    pub is_panning: bool,
    /// Last pointer position during panning (absolute)
    pub last_pan_pos: Option<egui::Pos2>,
    /// Whether the current press landed on an intersection marker
    pub marker_pressed: bool,
    /// Cumulative zoom ratio of the active two-finger pinch
    pub pinch_ratio: Option<f32>,
}

/// The main application structure.
///
/// Implements `eframe::App`; everything except the engine and the transient
/// interaction state is persisted as JSON between sessions.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct VennApp {
    /// The layout engine driving the diagram
    #[serde(skip)]
    pub engine: VennEngine,
    /// Layout tunables the engine is built from
    pub config: LayoutConfig,
    /// Pointer bookkeeping for the canvas
    #[serde(skip)]
    pub interaction: InteractionState,
    /// Whether the circle hierarchy side panel is shown
    pub show_hierarchy: bool,
    /// Whether the background grid is drawn
    pub show_grid: bool,
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Remembered width of the hierarchy panel across sessions
    pub hierarchy_panel_width: f32,
    /// Screen rectangle of the canvas in the last frame
    #[serde(skip)]
    pub canvas_rect: Option<egui::Rect>,
    /// Whether the world origin has been moved to the canvas centre
    #[serde(skip)]
    pub view_centered: bool,
    /// Circles of the most recently clicked intersection marker
    #[serde(skip)]
    pub last_marker_click: Option<(CircleId, CircleId)>,
}

impl Default for VennApp {
    fn default() -> Self {
        Self::with_config(LayoutConfig::default())
    }
}

impl VennApp {
    /// Creates an app whose engine uses `config`.
    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            engine: VennEngine::new(config.clone()),
            config,
            interaction: InteractionState::default(),
            show_hierarchy: true,
            show_grid: true,
            dark_mode: true,
            hierarchy_panel_width: 280.0,
            canvas_rect: None,
            view_centered: false,
            last_marker_click: None,
        }
    }

    /// Serializes the application state to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes application state from JSON. The engine is rebuilt from
    /// the restored config.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut app: Self = serde_json::from_str(json)?;
        app.engine = VennEngine::new(app.config.clone());
        Ok(app)
    }

    /// Resets any non-UI related fields in the [VennApp], so that when state is
    /// persisted only settings related to the UI are retained.
    pub fn reset_non_ui_fields(&mut self) {
        let config = self.config.clone();
        *self = Self {
            show_hierarchy: self.show_hierarchy,
            show_grid: self.show_grid,
            dark_mode: self.dark_mode,
            hierarchy_panel_width: self.hierarchy_panel_width,
            ..Self::with_config(config)
        };
    }

    /// Restores the app from eframe storage, falling back to defaults.
    pub fn from_storage(storage: Option<&dyn eframe::Storage>) -> Self {
        let Some(json) = storage.and_then(|storage| storage.get_string("app_state")) else {
            return Self::default();
        };
        match Self::from_json(&json) {
            Ok(mut app) => {
                app.reset_non_ui_fields();
                app
            }
            Err(err) => {
                log::warn!("Ignoring stored app state: {err}");
                Self::default()
            }
        }
    }
}

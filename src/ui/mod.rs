//! Desktop host for the Venn layout engine.
//!
//! # Module Organization
//!
//! - `state` - The [`VennApp`] struct and its persisted preferences
//! - `canvas` - Pointer, pan, wheel and pinch handling on the canvas
//! - `rendering` - Drawing the grid, circles, items and intersection lenses
//! - `debug_panel` - The read-only circle hierarchy side panel

mod canvas;
mod debug_panel;
mod rendering;
mod state;


pub use state::VennApp;

use eframe::egui;
use std::time::Duration;

/// Longest frame gap replayed into the physics clock.
const MAX_FRAME_DT: f32 = 0.25;

impl eframe::App for VennApp {
    /// Persist UI preferences and layout tunables between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.to_json() {
            Ok(json) => {
                storage.set_string("app_state", json);
            }
            Err(err) => {
                log::warn!("Failed to serialize app state: {err}");
            }
        }
    }

    /// Main update function called by egui for each frame.
    ///
    /// Advances the physics clock by the frame time, then lays out the
    /// toolbar, the optional hierarchy panel and the canvas.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        if !self.engine.is_mounted() {
            self.engine.mount();
        }

        let dt = ctx.input(|i| i.stable_dt).clamp(0.0, MAX_FRAME_DT);
        self.engine.advance(Duration::from_secs_f32(dt));

        if ctx.input(|i| i.viewport().close_requested()) {
            self.engine.unmount();
        }

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        if self.show_hierarchy {
            let viewport_width = ctx.input(|i| i.screen_rect().width());
            let max_allowed = (viewport_width * 0.9).max(180.0);
            let clamped_width = self.hierarchy_panel_width.clamp(180.0, max_allowed);

            egui::SidePanel::right("hierarchy_panel")
                .resizable(true)
                .default_width(clamped_width)
                .show(ctx, |ui| {
                    self.hierarchy_panel_width = ui.available_width().clamp(180.0, max_allowed);
                    self.draw_hierarchy_panel(ui);
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        if self.engine.is_mounted() {
            ctx.request_repaint_after(self.engine.config().tick_interval());
        }
    }
}

impl VennApp {
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Add Item").clicked() {
                self.engine.add_item();
            }

            ui.separator();

            if ui.button("−").on_hover_text("Zoom out").clicked() {
                self.engine.zoom_out();
            }
            ui.label(format!("{:.0}%", self.engine.viewport().scale * 100.0));
            if ui.button("+").on_hover_text("Zoom in").clicked() {
                self.engine.zoom_in();
            }

            ui.separator();

            ui.checkbox(&mut self.show_grid, "Grid");
            ui.checkbox(&mut self.show_hierarchy, "Hierarchy");
            ui.checkbox(&mut self.dark_mode, "Dark mode");

            ui.separator();

            let store = self.engine.store();
            ui.label(format!(
                "Items: {}  Groups: {}",
                store.item_count(),
                store.composites().len()
            ));
        });
    }
}

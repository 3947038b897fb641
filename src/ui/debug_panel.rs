//! Read-only "Circle Hierarchy" side panel.

use super::state::VennApp;
use crate::snapshot::ForestNode;
use eframe::egui;

fn short_id(id: &uuid::Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

impl VennApp {
    /// Draws the circle forest with parent/child annotations.
    pub fn draw_hierarchy_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Circle Hierarchy");

        let store = self.engine.store();
        ui.label(format!(
            "{} items in {} circles ({} top level)",
            store.item_count(),
            store.circle_count(),
            store.outermost().len()
        ));

        ui.horizontal(|ui| {
            if ui.button("Copy as JSON").clicked() {
                match self.engine.forest_json() {
                    Ok(json) => ui.ctx().copy_text(json),
                    Err(err) => log::warn!("Failed to serialize circle hierarchy: {err}"),
                }
            }
        });

        if let Some((a, b)) = self.last_marker_click {
            ui.label(format!("Last intersection: {} / {}", short_id(&a), short_id(&b)));
        }

        ui.separator();

        let forest = self.engine.forest();
        egui::ScrollArea::vertical().show(ui, |ui| {
            if forest.is_empty() {
                ui.label("No circles yet. Use \"Add Item\" to create one.");
            }
            for node in &forest {
                draw_forest_node(ui, node);
            }
        });
    }
}

fn draw_forest_node(ui: &mut egui::Ui, node: &ForestNode) {
    let title = format!(
        "Circle {} ({} items, r = {:.0})",
        short_id(&node.id),
        node.items.len(),
        node.radius
    );
    let details = |ui: &mut egui::Ui| {
        ui.label(format!("Position: ({:.0}, {:.0})", node.position.x, node.position.y));
        match node.parent {
            Some(parent) => ui.label(format!("Parent: {}", short_id(&parent))),
            None => ui.label("Parent: none"),
        };
    };

    if node.children.is_empty() {
        ui.label(title);
        ui.indent(node.id, details);
    } else {
        egui::CollapsingHeader::new(title)
            .id_salt(node.id)
            .default_open(true)
            .show(ui, |ui| {
                details(ui);
                for child in &node.children {
                    draw_forest_node(ui, child);
                }
            });
    }
}

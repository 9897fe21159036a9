use eframe::egui::{self, Align, Align2, Color32, Context, FontId, Layout, Sense, Ui};

use trustline_canvas::layout::LayoutMode;
use trustline_canvas::scheduler::SchedulerPhase;
use trustline_canvas::util::format_amount;

use super::ViewModel;

fn phase_label(phase: SchedulerPhase) -> &'static str {
    match phase {
        SchedulerPhase::Stopped => "stopped",
        SchedulerPhase::Active => "active",
        SchedulerPhase::IdleThrottled => "idle (throttled)",
        SchedulerPhase::DeepIdle => "deep idle",
    }
}

impl ViewModel {
    pub(super) fn show(&mut self, ctx: &Context, reload_requested: &mut bool) {
        self.step_network(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("trustline-canvas");
                    ui.separator();
                    ui.label(format!("source: {}", self.source_label));
                    if let Some(snapshot) = self.view.coordinator().snapshot() {
                        ui.label(format!("participants: {}", snapshot.nodes.len()));
                        ui.label(format!("trust lines: {}", snapshot.links.len()));
                        let used = snapshot.links.iter().map(|link| link.used).sum::<f64>();
                        ui.label(format!("credit in use: {}", format_amount(used)));
                        if let Some(generated_at) = &snapshot.generated_at {
                            ui.label(format!("generated: {generated_at}"));
                        }
                    }
                    if ui.button("Reload").clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(phase_label(self.view.phase()));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_canvas(ui));
    }

    fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Layout");
        let current = self.view.coordinator().mode();
        let mut mode = current;
        egui::ComboBox::from_label("Mode")
            .selected_text(mode.label())
            .show_ui(ui, |ui| {
                for option in LayoutMode::ALL {
                    ui.selectable_value(&mut mode, option, option.label());
                }
            });
        if mode != current {
            self.view.set_mode(mode);
        }

        ui.horizontal(|ui| {
            if ui.button("Relayout").clicked() {
                let delay = self.view.config().layout.relayout_debounce_ms;
                self.view.reset_layout_key_cache();
                self.view.request_relayout_debounced(delay);
            }
            if ui.button("Reset camera").clicked() {
                self.view.reset_camera();
            }
        });
        if self.network.is_some() {
            ui.checkbox(&mut self.paused, "Pause simulation");
        }

        ui.separator();
        ui.heading("Scheduler");
        let stats = self.view.stats();
        let viewport = self.view.viewport();
        let (display_nodes, display_links, rendered_at) = {
            let list = self.display.borrow();
            (list.nodes_drawn, list.links_drawn, list.rendered_at_ms)
        };
        egui::Grid::new("scheduler_stats")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("phase");
                ui.label(phase_label(self.view.phase()));
                ui.end_row();
                ui.label("frames drawn");
                ui.label(self.view.scheduler().frames_drawn().to_string());
                ui.end_row();
                ui.label("last frame");
                ui.label(format!("{rendered_at:.0} ms"));
                ui.end_row();
                ui.label("layout computes");
                ui.label(stats.computes.to_string());
                ui.end_row();
                ui.label("layout skips");
                ui.label(stats.skips.to_string());
                ui.end_row();
                ui.label("wakes");
                ui.label(stats.wakes.to_string());
                ui.end_row();
                ui.label("visible");
                ui.label(format!("{display_nodes} nodes / {display_links} links"));
                ui.end_row();
                ui.label("zoom");
                ui.label(format!("{:.2}x", viewport.zoom));
                ui.end_row();
                ui.label("pan");
                ui.label(format!("{:.0}, {:.0}", viewport.pan.x, viewport.pan.y));
                ui.end_row();
            });
    }

    fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        self.platform.sync_host(rect);
        for signal in self.platform.drain_signals() {
            self.view.on_host_signal(signal);
        }
        self.forward_input(ui, rect, &response);
        self.run_due();

        let painter = ui.painter_at(rect);
        let offset = rect.min.to_vec2();
        let list = self.display.borrow();
        match &list.background {
            Some(background) => {
                let mut background = background.clone();
                background.translate(offset);
                painter.add(background);
            }
            None => {
                painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));
            }
        }
        painter.extend(list.shapes.iter().cloned().map(|mut shape| {
            shape.translate(offset);
            shape
        }));
        for (position, text) in &list.labels {
            painter.text(
                *position + offset,
                Align2::LEFT_CENTER,
                text,
                FontId::proportional(12.0),
                Color32::from_gray(238),
            );
        }

        if !self.view.scheduler().has_rendered() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Waiting for the first layout...",
                FontId::proportional(14.0),
                Color32::from_gray(200),
            );
        }
    }
}

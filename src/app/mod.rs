use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use eframe::egui::{self, Context};
use tracing::info;

use trustline_canvas::config::ViewConfig;
use trustline_canvas::error::ConfigError;
use trustline_canvas::port::{EguiPlatform, Platform};
use trustline_canvas::snapshot::{SimulatedNetwork, Snapshot, load_snapshot};
use trustline_canvas::view::GraphView;

mod canvas;
mod input;
mod panels;

use canvas::{DisplayList, ShapeRenderer};

/// How long the loop keeps animating after the network changes shape.
const DEMO_HOLD_MS: f64 = 1_500.0;

pub enum SnapshotSource {
    File(PathBuf),
    Simulated { seed: u64, participants: usize },
}

pub struct TrustlineApp {
    options: LaunchOptions,
    state: AppState,
}

struct LaunchOptions {
    source: SnapshotSource,
    config: ViewConfig,
    tick_ms: f64,
}

enum AppState {
    Loading { rx: Receiver<Result<Snapshot, String>> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    platform: Rc<EguiPlatform>,
    view: GraphView<EguiPlatform>,
    display: Rc<RefCell<DisplayList>>,
    network: Option<SimulatedNetwork>,
    source_label: String,
    tick_ms: f64,
    paused: bool,
    last_step_ms: f64,
    seen_structural_changes: u64,
    interaction_hold: Rc<Cell<bool>>,
    demo_hold_until_ms: Rc<Cell<f64>>,
    pointer_down: bool,
}

impl TrustlineApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        source: SnapshotSource,
        config: ViewConfig,
        tick_ms: f64,
    ) -> Self {
        let options = LaunchOptions {
            source,
            config,
            tick_ms,
        };
        let state = Self::start(&cc.egui_ctx, &options);
        Self { options, state }
    }

    fn spawn_load(path: PathBuf) -> Receiver<Result<Snapshot, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_snapshot(&path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start(ctx: &Context, options: &LaunchOptions) -> AppState {
        match &options.source {
            SnapshotSource::File(path) => AppState::Loading {
                rx: Self::spawn_load(path.clone()),
            },
            SnapshotSource::Simulated { seed, participants } => {
                let network = SimulatedNetwork::new(*seed, *participants);
                let label = format!("simulated (seed {seed})");
                AppState::ready(ViewModel::new(ctx, options, label, None, Some(network)))
            }
        }
    }
}

impl AppState {
    fn ready(model: Result<ViewModel, ConfigError>) -> Self {
        match model {
            Ok(model) => Self::Ready(Box::new(model)),
            Err(error) => Self::Error(format!("invalid view config: {error}")),
        }
    }
}

impl ViewModel {
    fn new(
        ctx: &Context,
        options: &LaunchOptions,
        source_label: String,
        snapshot: Option<Snapshot>,
        network: Option<SimulatedNetwork>,
    ) -> Result<Self, ConfigError> {
        let platform = Rc::new(EguiPlatform::new(ctx.clone()));
        let display = Rc::new(RefCell::new(DisplayList::default()));
        let renderer = ShapeRenderer::new(Rc::clone(&display));
        let mut view = GraphView::with_default_engine(
            Rc::clone(&platform),
            options.config.clone(),
            Box::new(renderer),
        )?;

        let interaction_hold = Rc::new(Cell::new(false));
        let demo_hold_until_ms = Rc::new(Cell::new(0.0));
        {
            let clock = Rc::clone(&platform);
            let interaction = Rc::clone(&interaction_hold);
            let demo = Rc::clone(&demo_hold_until_ms);
            view.set_animation_predicate(move || interaction.get() || clock.now_ms() < demo.get());
        }

        let now = platform.now_ms();
        let initial = snapshot.or_else(|| network.as_ref().map(|network| network.snapshot(now)));
        if let Some(snapshot) = initial {
            info!(
                nodes = snapshot.nodes.len(),
                links = snapshot.links.len(),
                "snapshot ready"
            );
            view.set_snapshot(snapshot);
        }

        Ok(Self {
            seen_structural_changes: network
                .as_ref()
                .map_or(0, SimulatedNetwork::structural_changes),
            platform,
            view,
            display,
            network,
            source_label,
            tick_ms: options.tick_ms,
            paused: false,
            last_step_ms: now,
            interaction_hold,
            demo_hold_until_ms,
            pointer_down: false,
        })
    }

    fn step_network(&mut self, ctx: &Context) {
        if self.paused {
            return;
        }
        let Some(network) = self.network.as_mut() else {
            return;
        };

        let now = self.platform.now_ms();
        let remaining = self.tick_ms - (now - self.last_step_ms);
        if remaining > 0.0 {
            ctx.request_repaint_after(std::time::Duration::from_secs_f64(remaining / 1000.0));
            return;
        }

        let snapshot = network.step(now);
        let structural = network.structural_changes();
        if structural != self.seen_structural_changes {
            self.seen_structural_changes = structural;
            self.demo_hold_until_ms.set(now + DEMO_HOLD_MS);
        }
        self.last_step_ms = now;
        self.view.set_snapshot(snapshot);
        ctx.request_repaint_after(std::time::Duration::from_secs_f64(self.tick_ms / 1000.0));
    }

    fn run_due(&mut self) {
        for fired in self.platform.take_due() {
            self.view.dispatch(fired);
        }
    }
}

impl Drop for ViewModel {
    fn drop(&mut self) {
        self.view.dispose();
    }
}

impl eframe::App for TrustlineApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(snapshot) => {
                            let label = match &self.options.source {
                                SnapshotSource::File(path) => path.display().to_string(),
                                SnapshotSource::Simulated { .. } => "simulated".to_owned(),
                            };
                            AppState::ready(ViewModel::new(
                                ctx,
                                &self.options,
                                label,
                                Some(snapshot),
                                None,
                            ))
                        }
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading network snapshot...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load network snapshot");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start(ctx, &self.options));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                model.show(ctx, &mut reload_requested);
                if reload_requested {
                    transition = Some(Self::start(ctx, &self.options));
                }
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}

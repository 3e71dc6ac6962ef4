pub mod form;
pub mod markdown;
pub mod results;

use eframe::{egui, App};
use tokio::runtime::Handle;

use crate::config::Config;
use crate::relay::{RelayError, StreamingRelay};
use crate::session::{Session, ViewState};
use crate::store::{build_store, PassageStore};

use results::ResultsAction;

pub struct VocabReaderApp {
    session: Session,
    relay: Result<StreamingRelay, RelayError>,
    runtime: Handle,
    store: Box<dyn PassageStore>,
    user_id: u64,
    save_status: Option<Result<String, String>>,
    config_error: Option<String>,
}

impl VocabReaderApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: Config,
        runtime: Handle,
        config_error: Option<String>,
    ) -> Self {
        let relay = StreamingRelay::new(config.llm.clone());
        match &relay {
            Ok(relay) => log::info!("Using {}", relay.describe()),
            Err(e) => log::error!("Could not set up the completion client: {}", e),
        }
        Self {
            session: Session::default(),
            relay,
            runtime,
            store: build_store(&config.store),
            user_id: config.app.user_id,
            save_status: None,
            config_error,
        }
    }

    fn start_generation(&mut self, ctx: &egui::Context) {
        let request = match self.session.submit() {
            Ok(request) => request,
            Err(errors) => {
                log::debug!("Form rejected: {}", errors);
                return;
            }
        };
        let relay = match &self.relay {
            Ok(relay) => relay,
            Err(e) => {
                self.config_error = Some(e.to_string());
                return;
            }
        };
        let repaint = ctx.clone();
        let handle = relay.start(request, &self.runtime, move || repaint.request_repaint());
        self.save_status = None;
        self.session.begin(handle);
    }

    fn save(&mut self) {
        if !self.session.can_save() {
            return;
        }
        let record = self.session.save_record(self.user_id);
        self.save_status = Some(match self.store.save(&record) {
            Ok(ack) => Ok(ack.destination),
            Err(e) => {
                log::error!("Save failed: {}", e);
                Err(e.to_string())
            }
        });
    }

    fn back(&mut self) {
        self.session.back();
        self.save_status = None;
    }
}

impl App for VocabReaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.session.pump();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.separator();
                ui.strong("Vocabulary Reader");
            });
            if let Some(err) = &self.config_error {
                ui.colored_label(ui.visuals().error_fg_color, format!("Config Error: {}", err));
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.session.state() {
            ViewState::Form | ViewState::Streaming => {
                let submitted = egui::ScrollArea::vertical()
                    .id_source("form_scroll")
                    .auto_shrink([false, false])
                    .show(ui, |ui| form::show_form(ui, &mut self.session))
                    .inner;
                if submitted {
                    self.start_generation(ctx);
                }
            }
            ViewState::Results => {
                match results::show_results(ui, &self.session, self.save_status.as_ref()) {
                    ResultsAction::Back => self.back(),
                    ResultsAction::Save => self.save(),
                    ResultsAction::None => {}
                }
            }
        });
    }
}

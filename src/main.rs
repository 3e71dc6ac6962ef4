#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;

use clap::Parser;
use eframe::{egui, NativeOptions};
use env_logger::Env;

use vocab_reader_gui::config::{load_config_from_file, Config};
use vocab_reader_gui::ui::VocabReaderApp;

/// Desktop generator for vocabulary-based reading passages.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Model name, overriding the config file and environment.
    #[arg(long)]
    model: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long)]
    base_url: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let (mut config, config_error) = match load_config_from_file(&args.config) {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("Error loading {}: {}", args.config.display(), e);
            (Config::default(), Some(e.to_string()))
        }
    };
    config.apply_env_overrides();
    if let Some(model) = args.model {
        config.llm.model = model;
    }
    if let Some(base_url) = args.base_url {
        config.llm.base_url = base_url;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("vocab-relay")
        .build()?;
    let handle = runtime.handle().clone();

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 800.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Vocabulary Reader",
        options,
        Box::new(move |cc| Box::new(VocabReaderApp::new(cc, config, handle, config_error))),
    )?;

    runtime.shutdown_background();
    Ok(())
}

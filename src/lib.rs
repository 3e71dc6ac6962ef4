pub mod config;
pub mod parsing;
pub mod prompt;
pub mod relay;
pub mod session;
pub mod store;
pub mod types;
pub mod ui;
pub mod validation;

pub use config::{load_config_from_file, Config};
pub use session::{Session, ViewState};

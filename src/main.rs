mod app;
mod utils;
mod api;
mod chat;
mod discovery;
mod error;
mod ui;

use adw::prelude::*;
use adw::Application;

fn main() -> gtk4::glib::ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = Application::builder()
        .application_id("dev.elite.EliteGtk")
        .build();
    app.connect_activate(|app| {
        crate::app::build_ui(app);
    });
    app.run()
}

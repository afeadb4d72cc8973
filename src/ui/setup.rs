use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;
use std::time::Duration;

use crate::api::client::{ApiClient, MessagingBackend};
use crate::app::Settings;

pub fn show_setup_window(app: &Application, settings: Settings) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Élite Setup")
        .default_width(420)
        .default_height(260)
        .resizable(false)
        .build();

    let toast_overlay = adw::ToastOverlay::new();

    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);

    let title = gtk::Label::new(Some("Connect to messaging"));
    title.add_css_class("title-2");
    title.set_halign(gtk::Align::Start);
    root.append(&title);

    let endpoint_entry = gtk::Entry::new();
    endpoint_entry.set_placeholder_text(Some("Messaging endpoint URL"));
    endpoint_entry.set_hexpand(true);
    endpoint_entry.set_text(&settings.endpoint);

    let user_entry = gtk::Entry::new();
    user_entry.set_placeholder_text(Some("Your user id"));
    user_entry.set_input_purpose(gtk::InputPurpose::Digits);
    if let Some(id) = settings.user_id {
        user_entry.set_text(&id.to_string());
    }

    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&endpoint_entry);
    form.append(&user_entry);
    root.append(&form);

    let status = gtk::Label::new(None);
    status.add_css_class("dim-label");
    status.set_halign(gtk::Align::Start);
    root.append(&status);

    let connect_btn = gtk::Button::with_label("Continue");
    connect_btn.add_css_class("suggested-action");
    connect_btn.set_halign(gtk::Align::End);
    root.append(&connect_btn);

    toast_overlay.set_child(Some(&root));
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let header_title = gtk::Label::new(Some("Élite"));
    header.set_title_widget(Some(&header_title));
    container.append(&header);
    container.append(&toast_overlay);
    window.set_content(Some(&container));

    let on_connect = {
        let app = app.clone();
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let endpoint_entry = endpoint_entry.clone();
        let user_entry = user_entry.clone();
        let connect_btn = connect_btn.clone();
        move || {
            let next = match Settings::from_form(&endpoint_entry.text(), &user_entry.text(), &settings) {
                Ok(next) => next,
                Err(e) => {
                    overlay.add_toast(adw::Toast::new(&e.to_string()));
                    return;
                }
            };
            let Some(user_id) = next.user_id else { return };

            status.set_label("Checking endpoint…");
            connect_btn.set_sensitive(false);

            // A quick list call to tell the user whether the endpoint answers.
            let endpoint = next.endpoint.clone();
            let status_label = status.clone();
            let app = app.clone();
            let window = window.clone();
            let overlay = overlay.clone();
            let connect_btn = connect_btn.clone();
            crate::utils::run_async_to_main(
                async move {
                    let client = ApiClient::new(&endpoint, Duration::from_secs(5))?;
                    client.list_chats(user_id).await.map(|_| ())
                },
                move |res: Result<(), crate::error::ApiError>| {
                    match res {
                        Ok(()) => status_label.set_label("Connected"),
                        Err(e) => {
                            log::warn!("Endpoint check failed: {e}");
                            status_label.set_label("Saved (endpoint unreachable)");
                        }
                    }
                    connect_btn.set_sensitive(true);
                    if let Err(e) = next.save() {
                        overlay.add_toast(adw::Toast::new(&format!("Failed to save settings: {}", e)));
                    }
                    crate::ui::main_window::show_main_window(&app, next);
                    window.close();
                },
            );
        }
    };

    use std::rc::Rc;
    let on_connect: Rc<dyn Fn()> = Rc::new(on_connect);
    {
        let on_connect = on_connect.clone();
        connect_btn.connect_clicked(move |_| (on_connect)());
    }
    {
        let on_connect = on_connect.clone();
        endpoint_entry.connect_activate(move |_| (on_connect)());
    }
    {
        let on_connect = on_connect.clone();
        user_entry.connect_activate(move |_| (on_connect)());
    }

    window.present();
}

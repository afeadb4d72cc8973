use adw::prelude::*;
use adw::Application;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::api::client::ApiClient;
use crate::api::models::Conversation;
use crate::app::Settings;
use crate::chat::flow;
use crate::chat::state::ChatState;
use crate::discovery::{self, DiscoveryState, Profile, ViewMode};
use crate::ui::chat_view::ChatView;
use crate::ui::discovery_view::DiscoveryView;
use crate::ui::sidebar::Sidebar;

/// Glue between the chat widgets, `ChatState` and the messaging endpoint.
/// Network calls run on the Tokio runtime; state only changes on the main
/// loop when their results arrive.
struct ChatController {
    client: Arc<ApiClient>,
    state: RefCell<ChatState>,
    sidebar: Sidebar,
    view: ChatView,
}

impl ChatController {
    fn refresh_chats(self: &Rc<Self>) {
        let client = self.client.clone();
        let user_id = self.state.borrow().current_user_id();
        let this = self.clone();
        crate::utils::run_async_to_main(
            async move { flow::load_conversations(client.as_ref(), user_id).await },
            move |res| {
                if let Some(chats) = res {
                    this.state.borrow_mut().apply_conversations(chats);
                    this.render_conversations();
                }
            },
        );
    }

    fn refresh_messages(self: &Rc<Self>, chat_id: i64) {
        let client = self.client.clone();
        let this = self.clone();
        crate::utils::run_async_to_main(
            async move { flow::load_messages(client.as_ref(), chat_id).await },
            move |res| {
                let Some(messages) = res else { return };
                let applied = this.state.borrow_mut().apply_messages(chat_id, messages);
                if applied {
                    this.render_messages();
                }
            },
        );
    }

    fn open(self: &Rc<Self>, conv: &Conversation) {
        let fetch = self.state.borrow_mut().select(conv);
        self.render_selection();
        if let Some(chat_id) = fetch {
            self.refresh_messages(chat_id);
        }
    }

    /// Open a chat with the profile's user. Returns false when that user is
    /// the session's own.
    fn start_with(self: &Rc<Self>, profile: &Profile) -> bool {
        if !self.state.borrow().can_message(profile.id) {
            return false;
        }
        let image = (!profile.image.is_empty()).then(|| profile.image.clone());
        let fetch = self
            .state
            .borrow_mut()
            .start_conversation(profile.id, &profile.name, image);
        self.render_selection();
        if let Some(chat_id) = fetch {
            self.refresh_messages(chat_id);
        }
        true
    }

    fn send(self: &Rc<Self>) {
        let Some(request) = self.state.borrow_mut().begin_send() else { return };
        self.render_composer();
        let client = self.client.clone();
        let this = self.clone();
        crate::utils::run_async_to_main(
            async move { flow::send_and_refresh(client.as_ref(), request).await },
            move |outcome| {
                let succeeded = outcome.succeeded();
                this.state.borrow_mut().finish_send(outcome);
                if succeeded {
                    this.render_conversations();
                    this.render_selection();
                } else {
                    this.render_composer();
                }
            },
        );
    }

    fn render_conversations(&self) {
        let (chats, selected) = {
            let state = self.state.borrow();
            (state.conversations().to_vec(), state.selected_chat_id())
        };
        self.sidebar.set_items(&chats, selected);
    }

    fn render_messages(&self) {
        let state = self.state.borrow();
        self.view.set_messages(state.messages(), |m| state.is_own(m));
    }

    fn render_composer(&self) {
        let (draft, loading, can_send) = {
            let state = self.state.borrow();
            (state.draft().to_string(), state.is_loading(), state.can_send())
        };
        self.view.set_composer(&draft, loading, can_send);
    }

    fn render_selection(&self) {
        let selected = self.state.borrow().selected().cloned();
        self.view.show_chat(selected.as_ref());
        self.render_messages();
        self.render_composer();
    }
}

fn load_profiles(settings: &Settings) -> Vec<Profile> {
    match settings.profiles_path.as_deref() {
        Some(path) => discovery::load_profiles(path).unwrap_or_else(|e| {
            log::error!("Failed to load profiles: {e}");
            discovery::seed_profiles()
        }),
        None => discovery::seed_profiles(),
    }
}

fn favorites_label(count: usize) -> String {
    if count > 0 { format!("Favorites ({count})") } else { "Favorites".to_string() }
}

pub fn show_main_window(app: &Application, settings: Settings) {
    let Some(user_id) = settings.user_id else {
        crate::ui::setup::show_setup_window(app, settings);
        return;
    };
    let client = match ApiClient::new(&settings.endpoint, settings.request_timeout()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("Cannot use endpoint {:?}: {e}", settings.endpoint);
            crate::ui::setup::show_setup_window(app, settings);
            return;
        }
    };
    log::info!("Signed in as user {user_id} against {}", client.endpoint());

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Élite")
        .default_width(1200)
        .default_height(800)
        .build();

    let discovery_state = Rc::new(RefCell::new(DiscoveryState::new(load_profiles(&settings))));
    let discovery_view = DiscoveryView::new(discovery_state.clone(), client.http.clone(), user_id);

    let controller = Rc::new(ChatController {
        client: client.clone(),
        state: RefCell::new(ChatState::new(user_id)),
        sidebar: Sidebar::new(client.http.clone()),
        view: ChatView::new(client.http.clone()),
    });

    let chat_page = gtk4::Box::new(gtk4::Orientation::Horizontal, 0);
    chat_page.append(&controller.sidebar.widget());
    chat_page.append(&gtk4::Separator::new(gtk4::Orientation::Vertical));
    chat_page.append(&controller.view.widget());

    let stack = gtk4::Stack::new();
    stack.set_transition_type(gtk4::StackTransitionType::Crossfade);
    stack.add_named(&discovery_view.widget(), Some("discover"));
    stack.add_named(&chat_page, Some("messages"));

    let container = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = gtk4::Label::new(Some("Élite"));
    title.add_css_class("title-2");
    header.pack_start(&title);

    let nav = gtk4::Box::new(gtk4::Orientation::Horizontal, 6);
    let discover_btn = gtk4::ToggleButton::with_label("Discover");
    let favorites_btn = gtk4::ToggleButton::with_label(&favorites_label(0));
    let messages_btn = gtk4::ToggleButton::with_label("Messages");
    favorites_btn.set_group(Some(&discover_btn));
    messages_btn.set_group(Some(&discover_btn));
    discover_btn.set_active(true);
    nav.append(&discover_btn);
    nav.append(&favorites_btn);
    nav.append(&messages_btn);
    header.set_title_widget(Some(&nav));

    container.append(&header);
    container.append(&stack);
    window.set_content(Some(&container));

    let switch_mode: Rc<dyn Fn(ViewMode)> = {
        let stack = stack.clone();
        let state = discovery_state.clone();
        let view = discovery_view.clone();
        Rc::new(move |mode| {
            state.borrow_mut().set_mode(mode);
            match mode {
                ViewMode::Messages => stack.set_visible_child_name("messages"),
                ViewMode::Discover | ViewMode::Favorites => {
                    view.render();
                    stack.set_visible_child_name("discover");
                }
            }
        })
    };
    for (button, mode) in [
        (&discover_btn, ViewMode::Discover),
        (&favorites_btn, ViewMode::Favorites),
        (&messages_btn, ViewMode::Messages),
    ] {
        let switch_mode = switch_mode.clone();
        button.connect_toggled(move |btn| {
            if btn.is_active() {
                (switch_mode)(mode);
            }
        });
    }

    {
        let favorites_btn = favorites_btn.clone();
        discovery_view.connect_favorites_changed(move |count| {
            favorites_btn.set_label(&favorites_label(count));
        });
    }
    {
        let controller = controller.clone();
        let messages_btn = messages_btn.clone();
        discovery_view.connect_message(move |profile| {
            if controller.start_with(profile) {
                messages_btn.set_active(true);
            }
        });
    }
    {
        let weak = Rc::downgrade(&controller);
        controller.sidebar.connect_activated(move |conv| {
            if let Some(controller) = weak.upgrade() {
                controller.open(&conv);
            }
        });
    }
    {
        let weak = Rc::downgrade(&controller);
        controller.view.connect_send(move || {
            if let Some(controller) = weak.upgrade() {
                controller.send();
            }
        });
    }
    {
        let weak = Rc::downgrade(&controller);
        controller.view.connect_draft_changed(move |text| {
            let Some(controller) = weak.upgrade() else { return };
            // Echo of set_composer writing the draft back.
            let Ok(mut state) = controller.state.try_borrow_mut() else { return };
            state.set_draft(&text);
            drop(state);
            controller.render_composer();
        });
    }

    controller.refresh_chats();
    window.present();
}

use gtk4::prelude::*;
use gtk4 as gtk;

use crate::api::models::Message;
use crate::chat::format;
use crate::chat::state::ActiveChat;
use crate::ui::images::LatestRequest;

/// Message pane: counterpart header, scrolling message list and composer.
pub struct ChatView {
    root: gtk::Stack,
    avatar: adw::Avatar,
    name: gtk::Label,
    scroller: gtk::ScrolledWindow,
    messages_box: gtk::Box,
    entry: gtk::Entry,
    send_btn: gtk::Button,
    avatar_request: LatestRequest,
    http: reqwest::Client,
}

impl ChatView {
    pub fn new(http: reqwest::Client) -> Self {
        let root = gtk::Stack::new();
        root.set_hexpand(true);

        let placeholder = adw::StatusPage::builder()
            .icon_name("chat-message-new-symbolic")
            .title("Choose a chat")
            .description("Pick a conversation from the list or start a new one")
            .build();
        root.add_named(&placeholder, Some("empty"));

        let pane = gtk::Box::new(gtk::Orientation::Vertical, 6);
        pane.set_margin_top(8);
        pane.set_margin_bottom(8);
        pane.set_margin_start(8);
        pane.set_margin_end(8);

        let header = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        let avatar = adw::Avatar::new(40, None, true);
        let titles = gtk::Box::new(gtk::Orientation::Vertical, 2);
        let name = gtk::Label::new(None);
        name.add_css_class("heading");
        name.set_halign(gtk::Align::Start);
        let status = gtk::Label::new(Some("Online"));
        status.add_css_class("dim-label");
        status.add_css_class("caption");
        status.set_halign(gtk::Align::Start);
        titles.append(&name);
        titles.append(&status);
        header.append(&avatar);
        header.append(&titles);
        pane.append(&header);
        pane.append(&gtk::Separator::new(gtk::Orientation::Horizontal));

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .hscrollbar_policy(gtk::PolicyType::Never)
            .build();
        let messages_box = gtk::Box::new(gtk::Orientation::Vertical, 12);
        messages_box.set_margin_top(8);
        messages_box.set_margin_bottom(8);
        scroller.set_child(Some(&messages_box));
        pane.append(&scroller);

        // Input row
        let input_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let entry = gtk::Entry::new();
        entry.set_hexpand(true);
        entry.set_placeholder_text(Some("Write a message…"));
        let send_btn = gtk::Button::from_icon_name("mail-send-symbolic");
        send_btn.add_css_class("suggested-action");
        send_btn.set_sensitive(false);
        input_row.append(&entry);
        input_row.append(&send_btn);
        pane.append(&input_row);

        root.add_named(&pane, Some("chat"));
        root.set_visible_child_name("empty");

        Self {
            root,
            avatar,
            name,
            scroller,
            messages_box,
            entry,
            send_btn,
            avatar_request: LatestRequest::default(),
            http,
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    /// Fired by the send button and by Enter in the entry.
    pub fn connect_send<F: Fn() + 'static>(&self, f: F) {
        use std::rc::Rc;
        let send: Rc<dyn Fn()> = Rc::new(f);
        {
            let send = send.clone();
            self.send_btn.connect_clicked(move |_| (send)());
        }
        self.entry.connect_activate(move |_| (send)());
    }

    pub fn connect_draft_changed<F: Fn(String) + 'static>(&self, f: F) {
        self.entry.connect_changed(move |entry| f(entry.text().to_string()));
    }

    pub fn show_chat(&self, chat: Option<&ActiveChat>) {
        // Invalidates any avatar still loading for the previous chat.
        let ticket = self.avatar_request.next();
        let Some(chat) = chat else {
            self.root.set_visible_child_name("empty");
            return;
        };
        self.name.set_label(&chat.counterpart_name);
        self.avatar.set_text(Some(&chat.counterpart_name));
        self.avatar.set_custom_image(None::<&gtk::gdk::Paintable>);
        if let Some(url) = chat.counterpart_image.as_deref() {
            let avatar = self.avatar.clone();
            let latest = self.avatar_request.clone();
            crate::ui::images::load_texture(self.http.clone(), url, move |texture| {
                if latest.is_current(ticket) {
                    avatar.set_custom_image(Some(&texture));
                }
            });
        }
        self.root.set_visible_child_name("chat");
    }

    /// Rebuild the message list and scroll to the newest message.
    pub fn set_messages(&self, messages: &[Message], is_own: impl Fn(&Message) -> bool) {
        while let Some(child) = self.messages_box.first_child() {
            self.messages_box.remove(&child);
        }
        for message in messages {
            let own = is_own(message);
            let bubble = gtk::Box::new(gtk::Orientation::Vertical, 2);
            bubble.add_css_class("card");
            bubble.set_halign(if own { gtk::Align::End } else { gtk::Align::Start });
            bubble.set_margin_start(if own { 80 } else { 0 });
            bubble.set_margin_end(if own { 0 } else { 80 });

            let text = gtk::Label::new(Some(&message.content));
            text.set_wrap(true);
            text.set_xalign(0.0);
            text.set_selectable(true);
            text.set_margin_top(6);
            text.set_margin_start(10);
            text.set_margin_end(10);
            let time = gtk::Label::new(Some(&format::message_time(&message.created_at)));
            time.add_css_class("dim-label");
            time.add_css_class("caption");
            time.set_halign(gtk::Align::End);
            time.set_margin_bottom(6);
            time.set_margin_start(10);
            time.set_margin_end(10);
            if own {
                bubble.add_css_class("accent");
            }
            bubble.append(&text);
            bubble.append(&time);
            self.messages_box.append(&bubble);
        }

        let scroller = self.scroller.clone();
        gtk::glib::idle_add_local_once(move || {
            let adj = scroller.vadjustment();
            adj.set_value(adj.upper());
        });
    }

    pub fn set_composer(&self, draft: &str, loading: bool, can_send: bool) {
        if self.entry.text().as_str() != draft {
            self.entry.set_text(draft);
        }
        self.entry.set_sensitive(!loading);
        self.send_btn.set_sensitive(can_send);
    }
}

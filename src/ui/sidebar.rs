use gtk4::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::models::Conversation;
use crate::chat::format;

pub struct Sidebar {
    root: gtk::Box,
    list: gtk::ListBox,
    empty: gtk::Label,
    items: Rc<RefCell<Vec<Conversation>>>,
    http: reqwest::Client,
}

impl Sidebar {
    pub fn new(http: reqwest::Client) -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);
        root.set_width_request(300);

        let title = gtk::Label::new(Some("Chats"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        root.append(&title);

        let empty = gtk::Label::new(Some("No active chats"));
        empty.add_css_class("dim-label");
        empty.set_margin_top(24);
        root.append(&empty);

        let list = gtk::ListBox::new();
        list.add_css_class("navigation-sidebar");
        list.set_selection_mode(gtk::SelectionMode::Single);
        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hscrollbar_policy(gtk::PolicyType::Never)
            .child(&list)
            .build();
        root.append(&scroller);

        Self {
            root,
            list,
            empty,
            items: Rc::new(RefCell::new(Vec::new())),
            http,
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    /// Called with the clicked conversation.
    pub fn connect_activated<F: Fn(Conversation) + 'static>(&self, f: F) {
        let items = self.items.clone();
        self.list.connect_row_activated(move |_, row| {
            let picked = usize::try_from(row.index())
                .ok()
                .and_then(|idx| items.borrow().get(idx).cloned());
            if let Some(conv) = picked {
                f(conv);
            }
        });
    }

    pub fn set_items(&self, items: &[Conversation], selected: Option<i64>) {
        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }
        self.empty.set_visible(items.is_empty());
        *self.items.borrow_mut() = items.to_vec();

        for conv in items {
            let name = conv.other_user_name.clone().unwrap_or_default();
            let row = gtk::ListBoxRow::new();
            let line = gtk::Box::new(gtk::Orientation::Horizontal, 12);
            line.set_margin_top(8);
            line.set_margin_bottom(8);
            line.set_margin_start(8);
            line.set_margin_end(8);

            let avatar = adw::Avatar::new(40, Some(&name), true);
            if let Some(url) = conv.other_user_image.as_deref() {
                let avatar = avatar.clone();
                crate::ui::images::load_texture(self.http.clone(), url, move |texture| {
                    avatar.set_custom_image(Some(&texture));
                });
            }
            line.append(&avatar);

            let text = gtk::Box::new(gtk::Orientation::Vertical, 2);
            let title = gtk::Label::new(Some(&name));
            title.set_halign(gtk::Align::Start);
            title.set_ellipsize(gtk::pango::EllipsizeMode::End);
            title.add_css_class("heading");
            let preview = gtk::Label::new(Some(format::preview(conv)));
            preview.set_halign(gtk::Align::Start);
            preview.set_ellipsize(gtk::pango::EllipsizeMode::End);
            preview.add_css_class("dim-label");
            preview.add_css_class("caption");
            text.append(&title);
            text.append(&preview);
            line.append(&text);

            row.set_child(Some(&line));
            self.list.append(&row);
            if selected == Some(conv.chat_id) {
                self.list.select_row(Some(&row));
            }
        }
    }
}

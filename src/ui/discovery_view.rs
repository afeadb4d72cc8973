use gtk4::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::discovery::{
    DiscoveryState, Profile, AGE_MAX, AGE_MIN, DISTANCE_MAX_KM, DISTANCE_MIN_KM, INTEREST_TAGS,
};

type ProfileCallback = Rc<dyn Fn(&Profile)>;

/// Filter panel plus the profile grid for the discover and favorites modes.
pub struct DiscoveryView {
    root: gtk::Box,
    heading: gtk::Label,
    subtitle: gtk::Label,
    grid: gtk::FlowBox,
    age_min: gtk::Scale,
    age_max: gtk::Scale,
    distance: gtk::Scale,
    age_label: gtk::Label,
    distance_label: gtk::Label,
    state: Rc<RefCell<DiscoveryState>>,
    http: reqwest::Client,
    own_user_id: i64,
    on_favorites_changed: RefCell<Option<Rc<dyn Fn(usize)>>>,
    on_message: RefCell<Option<ProfileCallback>>,
}

fn slider(min: u32, max: u32) -> gtk::Scale {
    let scale = gtk::Scale::with_range(gtk::Orientation::Horizontal, min as f64, max as f64, 1.0);
    scale.set_digits(0);
    scale.set_draw_value(false);
    scale.set_hexpand(true);
    scale
}

fn labelled_row(title: &str, value: &gtk::Label) -> gtk::Box {
    let row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
    let label = gtk::Label::new(Some(title));
    label.set_halign(gtk::Align::Start);
    label.set_hexpand(true);
    value.add_css_class("dim-label");
    row.append(&label);
    row.append(value);
    row
}

impl DiscoveryView {
    pub fn new(state: Rc<RefCell<DiscoveryState>>, http: reqwest::Client, own_user_id: i64) -> Rc<Self> {
        let root = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        root.set_margin_top(12);
        root.set_margin_bottom(12);
        root.set_margin_start(12);
        root.set_margin_end(12);

        // Filters
        let panel = gtk::Box::new(gtk::Orientation::Vertical, 12);
        panel.add_css_class("card");
        panel.set_width_request(280);
        panel.set_valign(gtk::Align::Start);
        let inner = gtk::Box::new(gtk::Orientation::Vertical, 12);
        inner.set_margin_top(16);
        inner.set_margin_bottom(16);
        inner.set_margin_start(16);
        inner.set_margin_end(16);
        panel.append(&inner);

        let title = gtk::Label::new(Some("Filters"));
        title.add_css_class("title-3");
        title.set_halign(gtk::Align::Start);
        inner.append(&title);

        let age_label = gtk::Label::new(None);
        inner.append(&labelled_row("Age", &age_label));
        let age_min = slider(AGE_MIN, AGE_MAX);
        let age_max = slider(AGE_MIN, AGE_MAX);
        inner.append(&age_min);
        inner.append(&age_max);

        let distance_label = gtk::Label::new(None);
        inner.append(&labelled_row("Distance", &distance_label));
        let distance = slider(DISTANCE_MIN_KM, DISTANCE_MAX_KM);
        inner.append(&distance);

        let interests_title = gtk::Label::new(Some("Interests"));
        interests_title.set_halign(gtk::Align::Start);
        inner.append(&interests_title);
        let tags = gtk::FlowBox::new();
        tags.set_selection_mode(gtk::SelectionMode::None);
        for tag in INTEREST_TAGS {
            let badge = gtk::Label::new(Some(tag));
            badge.add_css_class("caption");
            badge.add_css_class("dim-label");
            tags.insert(&badge, -1);
        }
        inner.append(&tags);

        let reset = gtk::Button::with_label("Reset filters");
        inner.append(&reset);
        root.append(&panel);

        // Grid
        let content = gtk::Box::new(gtk::Orientation::Vertical, 6);
        content.set_hexpand(true);
        let heading = gtk::Label::new(None);
        heading.add_css_class("title-2");
        heading.set_halign(gtk::Align::Start);
        let subtitle = gtk::Label::new(None);
        subtitle.add_css_class("dim-label");
        subtitle.set_halign(gtk::Align::Start);
        content.append(&heading);
        content.append(&subtitle);

        let grid = gtk::FlowBox::new();
        grid.set_selection_mode(gtk::SelectionMode::None);
        grid.set_homogeneous(true);
        grid.set_min_children_per_line(1);
        grid.set_max_children_per_line(3);
        grid.set_column_spacing(16);
        grid.set_row_spacing(16);
        grid.set_valign(gtk::Align::Start);
        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hscrollbar_policy(gtk::PolicyType::Never)
            .child(&grid)
            .build();
        content.append(&scroller);
        root.append(&content);

        let view = Rc::new(Self {
            root,
            heading,
            subtitle,
            grid,
            age_min,
            age_max,
            distance,
            age_label,
            distance_label,
            state,
            http,
            own_user_id,
            on_favorites_changed: RefCell::new(None),
            on_message: RefCell::new(None),
        });
        view.sync_filters();

        for scale in [&view.age_min, &view.age_max] {
            let weak = Rc::downgrade(&view);
            scale.connect_value_changed(move |_| {
                let Some(view) = weak.upgrade() else { return };
                let (min, max) = (view.age_min.value() as u32, view.age_max.value() as u32);
                view.state.borrow_mut().set_age_range(min, max);
                view.sync_filters();
            });
        }
        {
            let weak = Rc::downgrade(&view);
            view.distance.connect_value_changed(move |scale| {
                let Some(view) = weak.upgrade() else { return };
                view.state.borrow_mut().set_max_distance(scale.value() as u32);
                view.sync_filters();
            });
        }
        {
            let weak = Rc::downgrade(&view);
            reset.connect_clicked(move |_| {
                let Some(view) = weak.upgrade() else { return };
                view.state.borrow_mut().reset_filters();
                view.sync_filters();
            });
        }

        view.render();
        view
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn connect_favorites_changed<F: Fn(usize) + 'static>(&self, f: F) {
        *self.on_favorites_changed.borrow_mut() = Some(Rc::new(f));
    }

    /// Fired by a card's "Message" button.
    pub fn connect_message<F: Fn(&Profile) + 'static>(&self, f: F) {
        *self.on_message.borrow_mut() = Some(Rc::new(f));
    }

    /// Push the filter values back into the widgets. Setting a scale to its
    /// current value emits nothing, so this settles after one round.
    fn sync_filters(&self) {
        let (filters, age_text, distance_text) = {
            let state = self.state.borrow();
            (state.filters(), state.age_label(), state.distance_label())
        };
        self.age_min.set_value(filters.age_min as f64);
        self.age_max.set_value(filters.age_max as f64);
        self.distance.set_value(filters.max_distance_km as f64);
        self.age_label.set_label(&age_text);
        self.distance_label.set_label(&distance_text);
    }

    pub fn render(self: &Rc<Self>) {
        let (heading, subtitle, profiles, favorites) = {
            let state = self.state.borrow();
            let profiles: Vec<Profile> = state.displayed_profiles().into_iter().cloned().collect();
            (state.heading(), state.subtitle(), profiles, state.favorites().to_vec())
        };
        self.heading.set_label(heading);
        self.subtitle.set_label(&subtitle);

        while let Some(child) = self.grid.first_child() {
            self.grid.remove(&child);
        }
        for profile in profiles {
            let card = self.profile_card(&profile, favorites.contains(&profile.id));
            self.grid.insert(&card, -1);
        }
    }

    fn profile_card(self: &Rc<Self>, profile: &Profile, favorite: bool) -> gtk::Box {
        let card = gtk::Box::new(gtk::Orientation::Vertical, 6);
        card.add_css_class("card");

        let overlay = gtk::Overlay::new();
        let picture = gtk::Picture::new();
        picture.set_can_shrink(true);
        picture.set_size_request(-1, 280);
        overlay.set_child(Some(&picture));
        {
            let picture = picture.clone();
            crate::ui::images::load_texture(self.http.clone(), &profile.image, move |texture| {
                picture.set_paintable(Some(&texture));
            });
        }

        let fav_btn = gtk::ToggleButton::new();
        fav_btn.set_icon_name(if favorite { "starred-symbolic" } else { "non-starred-symbolic" });
        fav_btn.set_active(favorite);
        fav_btn.add_css_class("circular");
        fav_btn.set_halign(gtk::Align::Start);
        fav_btn.set_valign(gtk::Align::Start);
        fav_btn.set_margin_top(12);
        fav_btn.set_margin_start(12);
        overlay.add_overlay(&fav_btn);

        if profile.verified {
            let badge = gtk::Label::new(Some("Verified"));
            badge.add_css_class("accent");
            badge.add_css_class("caption-heading");
            badge.set_halign(gtk::Align::End);
            badge.set_valign(gtk::Align::Start);
            badge.set_margin_top(12);
            badge.set_margin_end(12);
            overlay.add_overlay(&badge);
        }
        let distance = gtk::Label::new(Some(&format!("{} km away", profile.distance)));
        distance.add_css_class("osd");
        distance.set_halign(gtk::Align::Start);
        distance.set_valign(gtk::Align::End);
        distance.set_margin_bottom(12);
        distance.set_margin_start(12);
        overlay.add_overlay(&distance);
        card.append(&overlay);

        let body = gtk::Box::new(gtk::Orientation::Vertical, 6);
        body.set_margin_start(16);
        body.set_margin_end(16);
        body.set_margin_bottom(16);
        let name = gtk::Label::new(Some(&format!("{}, {}", profile.name, profile.age)));
        name.add_css_class("title-3");
        name.set_halign(gtk::Align::Start);
        let location = gtk::Label::new(Some(&profile.location));
        location.add_css_class("dim-label");
        location.set_halign(gtk::Align::Start);
        let bio = gtk::Label::new(Some(&profile.bio));
        bio.set_wrap(true);
        bio.set_lines(2);
        bio.set_ellipsize(gtk::pango::EllipsizeMode::End);
        bio.set_xalign(0.0);
        body.append(&name);
        body.append(&location);
        body.append(&bio);

        let interests = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        for interest in &profile.interests {
            let tag = gtk::Label::new(Some(interest));
            tag.add_css_class("caption");
            tag.add_css_class("dim-label");
            interests.append(&tag);
        }
        body.append(&interests);

        let actions = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        actions.set_homogeneous(true);
        let message_btn = gtk::Button::with_label("Message");
        message_btn.add_css_class("suggested-action");
        message_btn.set_sensitive(profile.id != self.own_user_id);
        actions.append(&message_btn);
        body.append(&actions);
        card.append(&body);

        {
            let weak = Rc::downgrade(self);
            let id = profile.id;
            fav_btn.connect_clicked(move |_| {
                let Some(view) = weak.upgrade() else { return };
                let count = {
                    let mut state = view.state.borrow_mut();
                    state.toggle_favorite(id);
                    state.favorites_count()
                };
                let callback = view.on_favorites_changed.borrow().clone();
                if let Some(cb) = callback {
                    cb(count);
                }
                // Rebuilding inside the click handler would drop the button
                // mid-signal.
                let view = view.clone();
                gtk::glib::idle_add_local_once(move || view.render());
            });
        }
        {
            let weak = Rc::downgrade(self);
            let profile = profile.clone();
            message_btn.connect_clicked(move |_| {
                let Some(view) = weak.upgrade() else { return };
                let callback = view.on_message.borrow().clone();
                if let Some(cb) = callback {
                    cb(&profile);
                }
            });
        }
        card
    }
}

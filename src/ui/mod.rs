pub mod chat_view;
pub mod discovery_view;
pub mod images;
pub mod main_window;
pub mod setup;
pub mod sidebar;

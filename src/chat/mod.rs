pub mod flow;
pub mod format;
pub mod state;

mod event;
mod terminal;

pub use event::{Event, EventHandler, EventSender};
pub use terminal::Tui;

mod combat_event;
mod error;
mod fight_events;

pub use combat_event::*;
pub use error::EventsError;
pub use fight_events::{FightEvents, after, window, window_inclusive};

//! Components - plain data for crew, tasks and events

mod crew;
mod event;
mod task;

pub use crew::*;
pub use event::*;
pub use task::*;

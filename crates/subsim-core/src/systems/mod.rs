//! Systems - logic that advances the simulation state

mod events;
mod firefighting;
mod medical;
mod repair;
mod tick;

pub use events::*;
pub use firefighting::*;
pub use medical::*;
pub use repair::*;
pub use tick::*;

//! Headless client for the conversion gateway.
pub mod args;
pub mod driver;
pub mod effects;

pub use args::{media_type_for, AppArgs};
pub use driver::Driver;
pub use effects::{map_event, EffectRunner};

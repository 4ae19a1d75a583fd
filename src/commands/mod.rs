//! CLI command implementations.

pub mod gifts;
pub mod info;

pub use gifts::GiftsCommand;
pub use info::InfoCommand;

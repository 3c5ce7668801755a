#![forbid(unsafe_code)]

pub mod model;
pub mod session;
pub mod time;
pub mod youtube;

pub use session::Session;
pub use time::Clock;

//! Logging infrastructure for console output.

mod logger;
mod subscriber;

pub use logger::Logger;
pub use subscriber::init_subscriber;
#[cfg(test)]
pub(crate) use subscriber::tests::capture;

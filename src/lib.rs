pub mod client;
pub mod controller;
pub mod model;
pub mod render;
pub mod throttle;

pub use client::{ClientError, HttpShortener, Shortener};
pub use controller::{OptionPanel, ResultDisplay, SubmissionController};
pub use model::{ShortenRequest, Ttl, View};

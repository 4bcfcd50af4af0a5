pub mod config;
pub mod donors;
pub mod finance;
pub mod fusion;
pub mod identity;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod races;
pub mod sources;
pub mod util;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_FUSION: &str = "fusion";

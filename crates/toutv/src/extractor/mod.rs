pub mod default;
pub mod error;
pub mod factory;
pub mod form;
pub mod platform_extractor;
pub mod platforms;
pub mod utils;

pub use default::{HttpConfig, default_factory};

mod builder;
pub mod claims;
mod config;
pub mod login;
mod models;

pub use builder::TouTv;
pub use builder::URL_REGEX;
pub use claims::ClaimsFetcher;
pub use config::TouTvEndpoints;
pub use login::{HandshakeStep, LoginError, LoginHandshake, extract_token};
pub use models::{ItemDetails, ItemMetadata};

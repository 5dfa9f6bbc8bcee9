mod account_service;
mod api_error;
mod auth_service;
pub mod paths;

pub use account_service::*;
pub use api_error::*;
pub use auth_service::*;

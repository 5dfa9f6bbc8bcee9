mod account_service_impl;
mod auth_service_impl;
mod fake_backend;

pub use account_service_impl::*;
pub use auth_service_impl::*;
pub use fake_backend::*;

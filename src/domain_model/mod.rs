mod credential;
mod job;
mod unit;
mod user;

pub use credential::*;
pub use job::*;
pub use unit::*;
pub use user::*;

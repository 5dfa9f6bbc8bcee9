mod session_observer;
mod transport;

pub use session_observer::*;
pub use transport::*;

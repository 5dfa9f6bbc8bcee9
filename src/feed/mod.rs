//! Cursor-paginated job feed, read through the session dispatcher so an
//! expired session is recovered transparently between pages.

mod job_feed;

pub use job_feed::*;

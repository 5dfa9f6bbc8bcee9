pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const ME_PATH: &str = "/users/me";
pub const JOB_FEED_PATH: &str = "/job-listings/feed";

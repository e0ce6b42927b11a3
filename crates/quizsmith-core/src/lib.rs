// Library root: the API client, session and quiz logic shared by the
// terminal front end and the integration tests.

pub mod api;
pub mod avatar;
pub mod config;
pub mod model;
pub mod quiz;
pub mod session;
pub mod store;

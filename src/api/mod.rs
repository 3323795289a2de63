//! Access to the track platform's REST API.

pub mod client;
pub mod schema;

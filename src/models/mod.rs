//! Data models for requests, responses, cookies and exchanges.

pub mod cookie;
pub mod request;
pub mod response;

pub use cookie::Cookie;
pub use request::{AdhocRequest, HttpMethod, MultiMap, PostProcessSource, Request};
pub use response::{Exchange, Response};

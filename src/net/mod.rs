//! Networking primitives: the URL model and the blocking HTTP client

mod http;
mod url;

pub use http::{HttpClient, HttpError, HttpResponse, RequestHeaders};
pub use url::{Url, UrlError};

//! Crawler module for paced page fetching
//!
//! This module contains the fetch pipeline, including:
//! - The HTTP transport seam and its reqwest implementation
//! - Redirect following with a hop limit
//! - HTML document parsing
//! - The single-lane scheduler that paces requests and consults the cache

mod adapter;
mod fetcher;
mod lane;
mod parser;
mod request;
mod scheduler;
mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use adapter::FetchResponse;
pub use fetcher::{FetchedPage, RedirectFetcher};
pub use parser::{extract_title, DocumentParser, HtmlParser};
pub use request::FetchRequest;
pub use scheduler::{Scheduler, SchedulerBuilder};
pub use transport::{
    build_http_client, content_type_of, parse_header, ReqwestTransport, Transport, TransportError,
    TransportResponse,
};

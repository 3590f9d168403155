//! HTTP client seam for the update pipeline.
//!
//! All outgoing requests go through the [`HttpClient`] trait so tests can
//! swap in a [`MockClient`] with canned responses.

pub(crate) mod charset;
mod client;

pub use client::{HttpClient, MockClient, MockResponse, WebClient, WebClientBuilder};

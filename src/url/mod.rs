//! URL handling module for Sumi-Courier
//!
//! This module provides the normalization used to derive cache keys and the
//! resolution of redirect `Location` values against the URL that produced them.

mod normalize;

pub use normalize::{cache_identity, normalize_url, resolve_location};

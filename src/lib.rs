//! trustprobe - TLS trust establishment and endpoint validation
//!
//! This crate builds TLS contexts from configurable trust material and
//! reports reachability of HTTP(S) endpoints through them. It is the
//! outbound-TLS foundation for components that call third-party services
//! (attribute sources, identity providers, health checks) under explicit
//! trust policies.

pub mod config;
pub mod probe;
pub mod trust;

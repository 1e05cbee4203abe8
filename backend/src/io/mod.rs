//! # IO Layer
//!
//! Everything that talks to the outside world over HTTP. Handlers translate
//! requests into domain calls and domain errors into status codes.

pub mod rest;

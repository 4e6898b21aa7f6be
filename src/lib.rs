//! # OAS Reflect
//!
//! Facade over [`oas_reflect_core`]: reflected type metadata in, OpenAPI 3.0
//! schemas and documents out.

pub use oas_reflect_core::*;

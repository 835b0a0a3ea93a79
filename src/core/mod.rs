//! Core data: configuration, the document-type catalog, the running environment
//! and the catalog resolver

pub mod catalog;
pub mod config;
pub mod environment;
pub mod resolver;

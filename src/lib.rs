//! A read-through / write-through cache in front of a document store, served
//! as a small JSON CRUD API.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

//! Domain use-case services.
//!
//! # Responsibility
//! - Mutate the entity graph the way library staff do (borrow, return).
//! - Keep loan handles consistent across system, librarian and reader.

pub mod lending_service;

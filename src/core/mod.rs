//! Core protocol logic

pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod service;
pub mod types;

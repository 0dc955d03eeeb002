// src/lib.rs

//! markdex: bookmark content crawler and summarizer library.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod text;
pub mod utils;

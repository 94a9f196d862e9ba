// src/generation/mod.rs

pub mod cleanup;
pub mod fallback;
pub mod invoker;
pub mod normalizer;
pub mod prompt;
pub mod retry;
pub mod service;

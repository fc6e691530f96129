//! Session persistence adapters

pub mod file_store;

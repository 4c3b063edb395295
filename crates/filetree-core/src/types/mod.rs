//! Core type definitions used across the FileTree workspace.

pub mod id;

pub use id::ItemId;

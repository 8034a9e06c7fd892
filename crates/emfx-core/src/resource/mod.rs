//! Resources: one loaded document each
//!
//! `ResourceContents` is the synchronous object table; `Resource` is the
//! shared, exclusive-access handle external callers use.

pub mod contents;
pub mod handle;

pub use contents::ResourceContents;
pub use handle::Resource;

//! Request session types

mod context;

pub use context::RequestContext;

//! Windows packaging: the service wrapper around the application image.

pub mod service;

pub use service::ServiceBundler;

pub mod analytics;
pub mod db;
pub mod demo;
pub mod domain;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod query;
pub mod records;
pub mod repo;
pub mod session;
pub mod timestamps;
pub mod workspace;

pub use error::{AppError, ErrorKind};
pub use session::Session;

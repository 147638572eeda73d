//! Application services: the use-cases behind the HTTP surface.

pub mod auth;
pub mod blogs;
pub mod error;
pub mod pagination;
pub mod repos;
pub mod users;

//! blogo: a social-blogging backend with users, blogs, follows and likes
//! served over a cache-aside REST API.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

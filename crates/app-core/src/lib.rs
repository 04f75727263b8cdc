pub mod config;
pub mod error;
pub mod extractors;
pub mod jwt;
pub mod middleware;
pub mod oauth;
pub mod response;
pub mod uid;

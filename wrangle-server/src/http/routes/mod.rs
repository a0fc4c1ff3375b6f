//! Route handlers organized by resource

pub mod auth;
pub mod contacts;
pub mod dashboard;
pub mod health;
pub mod records;
pub mod tables;

pub mod auth;
pub mod client;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod web;

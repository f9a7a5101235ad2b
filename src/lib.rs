pub mod config;
pub mod db;
pub mod dto;
pub mod encryption;
pub mod entity;
pub mod error;
pub mod invoice;
pub mod mailer;
pub mod middleware;
pub mod models;
pub mod password;
pub mod payments;
pub mod repository;
pub mod response;
pub mod routes;
pub mod services;
pub mod session;
pub mod signer;
pub mod state;

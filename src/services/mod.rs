pub mod admin_service;
pub mod auth_service;
pub mod checkout_service;
pub mod password_service;

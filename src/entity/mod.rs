pub mod orders;
pub mod tokens;
pub mod users;

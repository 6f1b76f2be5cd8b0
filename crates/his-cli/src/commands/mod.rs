pub mod auth;
pub mod check;
pub mod idcard;
pub mod import;
pub mod open;

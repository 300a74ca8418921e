pub mod auth;
pub mod payment;
pub mod scan;

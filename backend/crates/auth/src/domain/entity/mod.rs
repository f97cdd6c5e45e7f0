//! Entity Module

pub mod email_confirmation;
pub mod external_login;
pub mod refresh_token;
pub mod user;

pub mod email;
pub mod events;
pub mod password;
pub mod person_name;
pub mod phone_number;
pub mod session;
pub mod token;
pub mod user;
pub mod validation_error;

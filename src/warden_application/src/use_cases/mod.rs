pub mod change_password;
pub mod login;
pub mod logout;
pub mod refresh_session;
pub mod register;
pub mod request_password_reset;
pub mod resend_email_verification;
pub mod reset_password;
pub mod verify_email;

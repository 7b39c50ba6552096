use secrecy::ExposeSecret;
use warden_core::{NotificationEvent, NotificationKind, RawToken, User};

/// Front-end base URLs that tokens are appended to.
#[derive(Debug, Clone, Default)]
pub struct VerificationLinks {
    pub email_verification_base_url: Option<String>,
    pub password_reset_base_url: Option<String>,
}

impl VerificationLinks {
    pub fn email_verification_link(&self, token: &RawToken) -> String {
        build_link(
            self.email_verification_base_url.as_deref(),
            token,
            "email_verification_base_url",
        )
    }

    pub fn password_reset_link(&self, token: &RawToken) -> String {
        build_link(
            self.password_reset_base_url.as_deref(),
            token,
            "password_reset_base_url",
        )
    }
}

fn build_link(base_url: Option<&str>, token: &RawToken, setting: &str) -> String {
    let Some(base) = base_url.filter(|b| !b.is_empty()) else {
        return format!("(set links.{setting} to enable link)");
    };

    let token = token.as_ref().expose_secret();
    if base.ends_with('?') || base.ends_with('&') {
        format!("{base}token={token}")
    } else if base.contains('?') {
        format!("{base}&token={token}")
    } else {
        format!("{base}?token={token}")
    }
}

pub(crate) fn email_verification(user: &User, link: &str) -> NotificationEvent {
    let to = user.email.as_ref().expose_secret().as_str();
    let full_name = user.full_name();
    let html = format!(
        "<p>Hi {full_name},</p>\
         <p>Please verify your email address by clicking the link below:</p>\
         <p><a href=\"{link}\">Verify email</a></p>\
         <p>If you didn't create an account, you can ignore this email.</p>"
    );

    NotificationEvent::email(NotificationKind::EmailVerification)
        .with_metadata("to", to)
        .with_metadata("subject", "Verify your email")
        .with_metadata("html", html)
        .with_metadata("to_name", full_name)
        .with_metadata("first_name", user.first_name.as_str())
        .with_metadata("last_name", user.last_name.as_str())
        .with_metadata("email", to)
}

pub(crate) fn password_reset(user: &User, link: &str) -> NotificationEvent {
    let first_name = user.first_name.as_str();
    let html = format!(
        "<p>Hi {first_name},</p>\
         <p>We received a request to reset your password. Click the link below to set a new password:</p>\
         <p><a href=\"{link}\">Reset password</a></p>\
         <p>This link expires in 1 hour. If you didn't request this, you can ignore this email.</p>"
    );

    NotificationEvent::email(NotificationKind::PasswordReset)
        .with_metadata("to", user.email.as_ref().expose_secret().as_str())
        .with_metadata("subject", "Reset your password")
        .with_metadata("html", html)
        .with_metadata("to_name", first_name)
}

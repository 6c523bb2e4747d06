//! Admin/user notifications. Delivery is a log line; SMTP settings are
//! accepted in config but email sending is handled outside this service.

use crate::config::Config;

pub fn signup_received(config: &Config, admin_emails: &[String], user_email: &str) {
    if config.smtp.host.is_none() {
        tracing::info!(to = ?admin_emails, user = %user_email, "notification: signup pending approval");
        return;
    }
    tracing::info!(to = ?admin_emails, user = %user_email, "notification (smtp configured, delegated): signup pending approval");
}

pub fn account_decision(config: &Config, user_email: &str, approved: bool) {
    let decision = if approved { "approved" } else { "rejected" };
    if config.smtp.host.is_none() {
        tracing::info!(to = %user_email, decision, "notification: account decision");
        return;
    }
    tracing::info!(to = %user_email, decision, "notification (smtp configured, delegated): account decision");
}

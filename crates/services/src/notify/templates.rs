use traino_db::models::{Notification, NotificationType};

/// Single-segment SMS limit; longer bodies are cut to this length.
pub const SMS_MAX_LEN: usize = 160;

#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Call-to-action wording per notification type. Exhaustive on purpose:
/// a new type does not compile until it gets a label here.
fn cta_label(notification_type: NotificationType) -> &'static str {
    match notification_type {
        NotificationType::TrainingProgress => "View training",
        NotificationType::PaymentReminder => "View payment details",
        NotificationType::EvaluationDue => "Complete evaluation",
        NotificationType::Generic => "View details",
    }
}

/// Renders the email variant of a notification. Interpolated fields are
/// trusted platform data and are not HTML-escaped.
pub fn render_email(
    notification: &Notification,
    recipient_name: &str,
    base_url: &str,
) -> EmailContent {
    let label = cta_label(notification.notification_type);
    let link = notification
        .action_url
        .as_ref()
        .map(|path| format!("{base_url}{path}"));

    let cta_html = match &link {
        Some(url) => format!(
            "<p style=\"margin: 24px 0;\">\
             <a href=\"{url}\" style=\"background-color: #2563eb; color: #ffffff; \
             padding: 10px 20px; border-radius: 6px; text-decoration: none;\">{label}</a>\
             </p>"
        ),
        None => String::new(),
    };

    let html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h2 style=\"color: #111827;\">{title}</h2>\
         <p>Hi {name},</p>\
         <p>{message}</p>\
         {cta_html}\
         <hr style=\"border: none; border-top: 1px solid #e5e7eb;\"/>\
         <p style=\"color: #6b7280; font-size: 12px;\">\
         This is an automated message; replies are not monitored.</p>\
         </div>",
        title = notification.title,
        name = recipient_name,
        message = notification.message,
    );

    let mut text = format!(
        "Hi {name},\n\n{message}\n",
        name = recipient_name,
        message = notification.message,
    );
    if let Some(url) = &link {
        text.push_str(&format!("\n{label}: {url}\n"));
    }

    EmailContent {
        subject: notification.title.clone(),
        html,
        text,
    }
}

/// Renders the SMS variant: brand-prefixed title and message, an optional
/// link, capped at `SMS_MAX_LEN` characters with a `...` tail when cut.
pub fn render_sms(notification: &Notification, brand: &str, base_url: &str) -> String {
    let mut body = format!(
        "{brand}: {title}\n{message}",
        title = notification.title,
        message = notification.message,
    );

    if let Some(path) = &notification.action_url {
        body.push_str(&format!("\nView: {base_url}{path}"));
    }

    if body.chars().count() > SMS_MAX_LEN {
        let kept: String = body.chars().take(SMS_MAX_LEN - 3).collect();
        format!("{kept}...")
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::DateTime;
    use bson::oid::ObjectId;
    use traino_db::models::{
        ChannelSet, NotificationPriority, NotificationStatus,
    };

    fn notification(notification_type: NotificationType, action_url: Option<&str>) -> Notification {
        let now = DateTime::now();
        Notification {
            id: Some(ObjectId::new()),
            recipient_id: ObjectId::new(),
            notification_type,
            title: "Payment Reminder".to_string(),
            message: "Payment of $500 is due on 9/1/2024".to_string(),
            priority: NotificationPriority::High,
            channels: ChannelSet::with_enabled(true, true, true),
            status: NotificationStatus::Pending,
            scheduled_for: now,
            expires_at: None,
            related_entity: None,
            action_url: action_url.map(str::to_string),
            created_by: None,
            is_read: false,
            read_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn email_interpolates_name_message_and_link() {
        let n = notification(NotificationType::PaymentReminder, Some("/payments/abc"));
        let content = render_email(&n, "Jane Doe", "https://app.traino.io");

        assert_eq!(content.subject, "Payment Reminder");
        assert!(content.html.contains("Hi Jane Doe,"));
        assert!(content.html.contains("Payment of $500 is due on 9/1/2024"));
        assert!(content.html.contains("https://app.traino.io/payments/abc"));
        assert!(content.html.contains("View payment details"));
        assert!(content.text.contains("Payment of $500 is due on 9/1/2024"));
        assert!(content.text.contains("https://app.traino.io/payments/abc"));
    }

    #[test]
    fn email_without_action_url_has_no_link() {
        let n = notification(NotificationType::Generic, None);
        let content = render_email(&n, "Jane", "https://app.traino.io");

        assert!(!content.html.contains("<a href"));
        assert!(!content.text.contains("View details:"));
    }

    #[test]
    fn sms_short_body_passes_through() {
        let n = notification(NotificationType::PaymentReminder, None);
        let body = render_sms(&n, "Traino", "https://app.traino.io");

        assert_eq!(body, "Traino: Payment Reminder\nPayment of $500 is due on 9/1/2024");
        assert!(body.chars().count() <= SMS_MAX_LEN);
    }

    #[test]
    fn sms_long_body_truncates_to_exactly_160_with_ellipsis() {
        let mut n = notification(NotificationType::Generic, Some("/payments/abc"));
        n.message = "x".repeat(300);
        let body = render_sms(&n, "Traino", "https://app.traino.io");

        assert_eq!(body.chars().count(), SMS_MAX_LEN);
        assert!(body.ends_with("..."));
    }

    #[test]
    fn sms_includes_link_when_it_fits() {
        let mut n = notification(NotificationType::EvaluationDue, Some("/evaluations/e1"));
        n.title = "Evaluation Due".to_string();
        n.message = "Please complete your evaluation".to_string();
        let body = render_sms(&n, "Traino", "https://app.traino.io");

        assert!(body.contains("View: https://app.traino.io/evaluations/e1"));
    }
}

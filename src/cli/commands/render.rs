use crate::reservations::ClientRecord;
use crate::workflow::{ErrorKind, Notification};

/// Client summary shown while a client is under review.
pub fn render_client_summary(record: &ClientRecord) -> String {
    let mut lines = vec![
        format!("🎫 Reservation #{}", record.reservation_id),
        format!("   👤 Name: {}", record.client.name),
        format!("   📧 Email: {}", record.client.email.as_deref().unwrap_or("-")),
        format!("   📞 Phone: {}", record.client.phone.as_deref().unwrap_or("-")),
    ];

    if let Some(status) = &record.status {
        lines.push(format!("   🏷️  Status: {status}"));
    }

    if record.items.is_empty() {
        lines.push("   🍽️  No dishes ordered".to_string());
    } else {
        lines.push("   🍽️  Order:".to_string());
        for item in &record.items {
            lines.push(format!(
                "      - {} x{} : {:.2}",
                item.dish,
                item.quantity,
                item.line_total()
            ));
        }
    }

    lines.push(format!("   💰 Total: {:.2}", record.total));
    lines.join("\n")
}

pub fn render_notification(notification: &Notification) -> String {
    match notification {
        Notification::ClientArrived { record } => render_client_summary(record),
        Notification::Served {
            reservation_id,
            message,
        } => format!("✅ #{reservation_id}: {message}"),
        Notification::Dismissed { reservation_id } => {
            format!("↩️  #{reservation_id} dismissed, back to scanning")
        }
        Notification::Error { kind, message } => match kind {
            ErrorKind::VerificationFailed => format!("❌ {message}"),
            ErrorKind::ServeFailed => format!("❌ {message} (press s to retry)"),
        },
    }
}

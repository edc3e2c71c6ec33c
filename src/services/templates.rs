use chrono::{DateTime, Utc};

use crate::config::ClinicInfo;
use crate::models::Booking;

/// Subject and HTML body for one outgoing email.
pub struct Rendered {
    pub subject: String,
    pub html: String,
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn field(label: &str, value: &str) -> String {
    format!("<p><strong>{label}:</strong> {}</p>\n", escape(value))
}

pub fn requester_confirmation(booking: &Booking, clinic: &ClinicInfo) -> Rendered {
    let mut html = String::new();
    html.push_str("<h2>Thank you for your booking request!</h2>\n");
    html.push_str(&format!("<p>Dear {},</p>\n", escape(&booking.name)));
    html.push_str("<p>We have received your appointment request with the following details:</p>\n");
    html.push_str(&field("Service", booking.service.as_str()));
    html.push_str(&field("Date", &booking.date));
    html.push_str(&field("Time", &booking.time));
    html.push_str(&field("Phone", &booking.phone));
    html.push_str(&field("Reference", &booking.id));
    html.push_str(&format!(
        "<p>If you have any questions, please contact us at {}</p>\n",
        escape(&clinic.phone)
    ));
    html.push_str(&format!("<p>Best regards,<br>{}</p>\n", escape(&clinic.name)));

    Rendered {
        subject: format!("Appointment Request Received - {}", clinic.name),
        html,
    }
}

pub fn staff_alert(booking: &Booking) -> Rendered {
    let notes = if booking.notes.is_empty() {
        "None"
    } else {
        booking.notes.as_str()
    };

    let mut html = String::from("<h2>New Appointment Booking</h2>\n");
    html.push_str(&field("Service", booking.service.as_str()));
    html.push_str(&field("Date", &booking.date));
    html.push_str(&field("Time", &booking.time));
    html.push_str(&field("Name", &booking.name));
    html.push_str(&field("Phone", &booking.phone));
    html.push_str(&field("Email", &booking.email));
    html.push_str(&field("Additional Notes", notes));
    html.push_str(&field("Reference", &booking.id));
    html.push_str(&field(
        "Submitted",
        &booking.booked_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    ));

    Rendered {
        subject: format!("New Booking Request from {}", booking.name),
        html,
    }
}

pub fn subscription_alert(email: &str, at: DateTime<Utc>, clinic: &ClinicInfo) -> Rendered {
    let mut html = String::from("<h2>New Newsletter Subscription</h2>\n");
    html.push_str("<p>A new user has subscribed to the newsletter:</p>\n");
    html.push_str(&field("Email", email));
    html.push_str(&field("Date", &at.format("%Y-%m-%d %H:%M:%S UTC").to_string()));

    Rendered {
        subject: format!("New Newsletter Subscription - {}", clinic.name),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingRequest;

    fn clinic() -> ClinicInfo {
        ClinicInfo {
            name: "Test Clinic".to_string(),
            phone: "+91 00000 00000".to_string(),
            whatsapp_number: None,
        }
    }

    fn booking(notes: Option<&str>) -> Booking {
        let req = BookingRequest {
            service: Some("Sports Injury Rehab".to_string()),
            date: Some("2025-09-10".to_string()),
            time: Some("16:30".to_string()),
            name: Some("Tom <b>".to_string()),
            phone: Some("42".to_string()),
            email: Some("tom@example.com".to_string()),
            notes: notes.map(str::to_string),
        };
        Booking::create(req.validate().unwrap())
    }

    #[test]
    fn test_requester_confirmation() {
        let b = booking(None);
        let r = requester_confirmation(&b, &clinic());
        assert_eq!(r.subject, "Appointment Request Received - Test Clinic");
        assert!(r.html.contains("Sports Injury Rehab"));
        assert!(r.html.contains("2025-09-10"));
        assert!(r.html.contains("16:30"));
        assert!(r.html.contains(&b.id));
        assert!(r.html.contains("+91 00000 00000"));
        assert!(r.html.contains("Dear Tom &lt;b&gt;"));
    }

    #[test]
    fn test_staff_alert_includes_contact_and_timestamp() {
        let b = booking(Some("knee"));
        let r = staff_alert(&b);
        assert_eq!(r.subject, "New Booking Request from Tom <b>");
        assert!(r.html.contains("tom@example.com"));
        assert!(r.html.contains("knee"));
        assert!(r.html.contains(&b.booked_at.format("%Y-%m-%d %H:%M:%S").to_string()));
    }

    #[test]
    fn test_staff_alert_without_notes() {
        let r = staff_alert(&booking(None));
        assert!(r.html.contains("<strong>Additional Notes:</strong> None"));
    }
}

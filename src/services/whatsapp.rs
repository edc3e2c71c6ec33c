use reqwest::Url;

use crate::models::Booking;

/// Builds a `wa.me` link with a pre-filled message the client can send to the
/// clinic. Returns `None` if the number has no digits.
pub fn chat_link(number: &str, booking: &Booking) -> Option<String> {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    let mut text = format!(
        "Hello, I'd like to confirm my appointment.\nService: {}\nDate: {}\nTime: {}\nName: {}\nPhone: {}\nReference: {}",
        booking.service, booking.date, booking.time, booking.name, booking.phone, booking.id
    );
    if !booking.notes.is_empty() {
        text.push_str(&format!("\nNotes: {}", booking.notes));
    }

    Url::parse_with_params(&format!("https://wa.me/{digits}"), &[("text", text)])
        .ok()
        .map(String::from)
}

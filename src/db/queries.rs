use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Booking, Service, Slot};

const BOOKING_COLUMNS: &str = "id, service, date, time, name, phone, email, notes, booked_at";

// Fixed-width RFC 3339 so lexical order in SQLite matches chronological order.
fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Returns the number of rows written. A slot collision surfaces as a
/// `ConstraintViolation` from the `UNIQUE (service, date, time)` index.
pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO bookings (id, service, date, time, name, phone, email, notes, booked_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            booking.id,
            booking.service.as_str(),
            booking.date,
            booking.time,
            booking.name,
            booking.phone,
            booking.email,
            booking.notes,
            format_ts(&booking.booked_at),
        ],
    )
}

pub fn find_booking_by_slot(conn: &Connection, slot: &Slot<'_>) -> anyhow::Result<Option<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE service = ?1 AND date = ?2 AND time = ?3"
    );
    let row = conn
        .query_row(
            &sql,
            params![slot.service.as_str(), slot.date, slot.time],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    row.transpose()
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id], |row| Ok(parse_booking_row(row)))
        .optional()?;

    row.transpose()
}

pub fn list_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY booked_at DESC, rowid DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let service_str: String = row.get(1)?;
    let booked_at_str: String = row.get(8)?;

    let service = Service::parse(&service_str)
        .ok_or_else(|| anyhow::anyhow!("unknown service in store: {service_str}"))?;
    let booked_at = DateTime::parse_from_rfc3339(&booked_at_str)?.with_timezone(&Utc);

    Ok(Booking {
        id: row.get(0)?,
        service,
        date: row.get(2)?,
        time: row.get(3)?,
        name: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        notes: row.get(7)?,
        booked_at,
    })
}

pub mod booking;
pub mod messaging;
pub mod notification;
pub mod templates;
pub mod whatsapp;

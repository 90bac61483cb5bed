//! GDI painting for the overlay.

pub mod chat;
pub mod theme;

//! Port traits: inbound API and outbound SPI.

pub mod inbound;
pub mod outbound;

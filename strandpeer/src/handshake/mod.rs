// Handshake module declarations

pub mod messages;
pub mod state;

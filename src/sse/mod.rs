//! Real-time push to connected clients

mod broadcaster;

pub use broadcaster::{Broadcaster, ConnectionHandle, SONGS_GROUP};

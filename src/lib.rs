pub mod bet;
pub mod channel;
pub mod config;
pub mod engine;
pub mod events;
pub mod format;
pub mod notice;
pub mod position;
pub mod roster;
pub mod round;
pub mod trail;

pub use engine::{
    Controls,
    Effect,
    Engine,
    Snapshot,
};
pub use events::{
    Inbound,
    Outbound,
    SessionId,
};

pub mod models;

pub use models::{Channel, ChannelTable, Message, User};

pub mod connection;
pub mod games;
pub mod group_players;
pub mod groups;
pub mod models;
pub mod players;
pub mod sessions;
pub mod setup;

pub use connection::{create_memory_pool, create_pool, get_connection, DbConn, DbPool};
pub use models::*;

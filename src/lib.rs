pub mod db;
pub mod directory;
pub mod error;
pub mod message;
pub mod middleware;
pub mod routes;
pub mod state;

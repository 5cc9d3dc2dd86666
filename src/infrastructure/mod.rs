pub mod auth;
pub mod client;
pub mod directory;
pub mod orders;
pub mod plants;
pub mod realtime;
pub mod storage;

pub mod cat;
pub mod config;
pub mod exists;
pub mod filter;
pub mod images;
pub mod ls;
pub mod mkdir;
pub mod ping;
pub mod rm;
pub mod stat;
pub mod write;

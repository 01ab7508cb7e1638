pub mod connection;
pub mod dao;
pub mod entities;
pub mod schema;
pub mod seed;

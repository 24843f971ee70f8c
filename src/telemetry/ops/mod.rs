pub mod auth;
pub mod browse;
pub mod feed;
pub mod like;
pub mod search;
pub mod tags;

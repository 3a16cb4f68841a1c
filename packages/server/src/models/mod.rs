pub mod auth;
pub mod event;
pub mod invite;
pub mod project;
pub mod results;
pub mod shared;
pub mod team;
pub mod user;

pub mod auth;
pub mod event;
pub mod invites;
pub mod projects;
pub mod results;
pub mod teams;
pub mod users;

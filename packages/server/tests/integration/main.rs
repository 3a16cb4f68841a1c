
mod event;
mod invite;
mod postgres;
mod project;
mod results;
mod user;
mod voting;

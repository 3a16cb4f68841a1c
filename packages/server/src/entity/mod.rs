pub mod event;
pub mod judge_score;
pub mod project;
pub mod team;
pub mod team_invite;
pub mod team_member;
pub mod user;
pub mod vote;

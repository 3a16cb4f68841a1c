use utoipa_axum::{router::OpenApiRouter, routes};

use crate::handlers::{auth, event, invites, projects, results, teams, users};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(auth_routes())
        .merge(event_routes())
        .merge(user_routes())
        .merge(team_routes())
        .merge(invite_routes())
        .merge(project_routes())
        .merge(result_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::me))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(event::get_event, event::update_event))
        .routes(routes!(event::advance_phase))
        .routes(routes!(event::set_phase))
        .routes(routes!(event::auto_assign))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(users::list_users))
        .routes(routes!(users::update_profile))
        .routes(routes!(users::set_free_agent))
        .routes(routes!(users::list_free_agents))
        .routes(routes!(users::set_role))
}

fn team_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(teams::list_teams, teams::create_team))
        .routes(routes!(teams::my_team))
        .routes(routes!(teams::get_team, teams::update_team))
        .routes(routes!(teams::leave_team))
        .routes(routes!(teams::remove_member))
        .routes(routes!(teams::transfer_captain))
        .routes(routes!(teams::send_invite))
        .routes(routes!(teams::request_to_join))
}

fn invite_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(invites::list_invites))
        .routes(routes!(invites::accept_invite))
        .routes(routes!(invites::decline_invite))
        .routes(routes!(invites::cancel_invite))
}

fn project_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(projects::list_projects))
        .routes(routes!(projects::get_project, projects::update_project))
        .routes(routes!(projects::submit_project))
        .routes(routes!(projects::cast_vote, projects::retract_vote))
        .routes(routes!(projects::my_votes))
        .routes(routes!(projects::score_project))
        .routes(routes!(projects::list_scores))
}

fn result_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(results::results))
        .routes(routes!(results::analytics))
}

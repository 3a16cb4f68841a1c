//! The same flows against the PostgreSQL store. Needs Docker:
//! `cargo test -- --ignored postgres`.

use serde_json::json;

use crate::common::{TestApp, routes};
use crate::voting::showcase;

#[tokio::test]
#[ignore = "requires Docker"]
async fn team_lifecycle_on_postgres() {
    let app = TestApp::spawn_with_postgres().await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    let carol = app.create_authenticated_user("carol").await;
    app.put_with_token(routes::FREE_AGENT, &json!({"is_free_agent": true}), &carol)
        .await;
    app.advance_to("team_formation").await;

    let team_id = app.create_team(&alice, "Rustaceans").await;
    let duplicate = app
        .post_with_token(routes::TEAMS, &json!({"name": "RUSTACEANS"}), &bob)
        .await;
    assert_eq!(duplicate.status, 409);

    app.add_member(team_id, &alice, &bob).await;
    let team = app.get_with_token(&routes::team(team_id), &bob).await;
    assert_eq!(team.body["member_count"], 2);

    let advance = app
        .post_with_token(routes::EVENT_ADVANCE, &json!({}), app.admin_token())
        .await;
    assert_eq!(advance.status, 200, "{}", advance.text);
    assert_eq!(advance.body["event"]["phase"], "hacking");
    let carol_id = app.user_id(&carol).await;
    assert_eq!(advance.body["auto_assigned"], json!([carol_id]));

    let left = app
        .post_with_token(&routes::team_leave(team_id), &json!({}), &bob)
        .await;
    assert_eq!(left.status, 200, "{}", left.text);
    assert_eq!(left.body["team"]["member_count"], 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn invite_flow_on_postgres() {
    let app = TestApp::spawn_with_postgres().await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    let carol = app.create_authenticated_user("carol").await;
    app.advance_to("team_formation").await;
    let team_id = app.create_team(&alice, "Rustaceans").await;
    let other_team = app.create_team(&carol, "Other").await;

    let request = app
        .post_with_token(&routes::team_join_requests(other_team), &json!({}), &bob)
        .await;
    assert_eq!(request.status, 201, "{}", request.text);

    let bob_id = app.user_id(&bob).await;
    let invite = app
        .post_with_token(&routes::team_invites(team_id), &json!({"user_id": bob_id}), &alice)
        .await;
    let accepted = app
        .post_with_token(&routes::invite_accept(invite.id()), &json!({}), &bob)
        .await;
    assert_eq!(accepted.status, 200, "{}", accepted.text);

    let late = app
        .post_with_token(&routes::invite_accept(request.id()), &json!({}), &carol)
        .await;
    assert_eq!(late.status, 409);
    assert_eq!(late.body["code"], "CONFLICT");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn voting_and_results_on_postgres() {
    let s = showcase(TestApp::spawn_with_postgres().await).await;
    let carol = s.app.create_authenticated_user("carol").await;
    let judge = s.app.create_user_with_role("jules", "judge").await;
    s.app.advance_to("voting").await;

    let vote = s
        .app
        .post_with_token(&routes::project_vote(s.beta_project), &json!({}), &carol)
        .await;
    assert_eq!(vote.status, 201, "{}", vote.text);
    let dup = s
        .app
        .post_with_token(&routes::project_vote(s.beta_project), &json!({}), &carol)
        .await;
    assert_eq!(dup.status, 409);

    s.app.advance_to("judging").await;
    let score = s
        .app
        .put_with_token(
            &routes::project_score(s.alpha_project),
            &json!({"scores": {"innovation": 8, "execution": 8, "impact": 8, "presentation": 8}}),
            &judge,
        )
        .await;
    assert_eq!(score.status, 200, "{}", score.text);

    s.app.advance_to("results").await;
    let results = s.app.get_with_token(routes::RESULTS, &s.alice).await;
    assert_eq!(results.status, 200, "{}", results.text);
    assert_eq!(results.body["entries"][0]["project_id"], s.alpha_project);
    assert_eq!(results.body["peoples_choice"]["project_id"], s.beta_project);
}

use serde_json::json;

use crate::common::{TestApp, routes};

/// Hacking phase with `alice` captaining a team; returns the team's project id.
async fn setup() -> (TestApp, String, i32) {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;
    app.advance_to("team_formation").await;
    let team_id = app.create_team(&alice, "Rustaceans").await;
    app.advance_to("hacking").await;
    let project_id = app.team_project_id(team_id, &alice).await;
    (app, alice, project_id)
}

mod drafts {
    use super::*;

    #[tokio::test]
    async fn saving_moves_the_project_to_draft() {
        let (app, alice, project_id) = setup().await;

        let res = app
            .patch_with_token(
                &routes::project(project_id),
                &json!({"title": "Smart Meeting Summarizer", "demo_url": "https://demo.example.com"}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "draft");
        assert_eq!(res.body["title"], "Smart Meeting Summarizer");
        assert_eq!(res.body["demo_url"], "https://demo.example.com");
    }

    #[tokio::test]
    async fn links_must_be_http_urls() {
        let (app, alice, project_id) = setup().await;

        let res = app
            .patch_with_token(
                &routes::project(project_id),
                &json!({"repo_url": "ftp://example.com/repo"}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn outsiders_cannot_see_or_edit_a_draft() {
        let (app, _alice, project_id) = setup().await;
        let mallory = app.create_authenticated_user("mallory").await;

        let view = app.get_with_token(&routes::project(project_id), &mallory).await;
        assert_eq!(view.status, 404);

        let list = app.get_with_token(routes::PROJECTS, &mallory).await;
        assert_eq!(list.body, json!([]));

        let edit = app
            .patch_with_token(&routes::project(project_id), &json!({"title": "Mine now"}), &mallory)
            .await;
        assert_eq!(edit.status, 403);
        assert_eq!(edit.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn admins_see_every_project() {
        let (app, _alice, project_id) = setup().await;

        let res = app.get_with_token(&routes::project(project_id), app.admin_token()).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "not_started");
    }

    #[tokio::test]
    async fn drafts_are_closed_before_hacking() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        app.advance_to("team_formation").await;
        let team_id = app.create_team(&alice, "Rustaceans").await;
        let project_id = app.team_project_id(team_id, &alice).await;

        let res = app
            .patch_with_token(&routes::project(project_id), &json!({"title": "Early"}), &alice)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "PHASE_CLOSED");
    }
}

mod submission {
    use super::*;

    #[tokio::test]
    async fn submit_requires_the_submission_phase() {
        let (app, alice, project_id) = setup().await;

        let res = app
            .post_with_token(&routes::project_submit(project_id), &json!({}), &alice)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "PHASE_CLOSED");
    }

    #[tokio::test]
    async fn submit_requires_a_title_and_a_link() {
        let (app, alice, project_id) = setup().await;
        app.patch_with_token(&routes::project(project_id), &json!({"title": "No links"}), &alice)
            .await;
        app.advance_to("submission").await;

        let res = app
            .post_with_token(&routes::project_submit(project_id), &json!({}), &alice)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn submitted_project_stays_submitted_and_public() {
        let (app, alice, project_id) = setup().await;
        app.advance_to("submission").await;
        app.submit_project(project_id, &alice, "Summarizer").await;

        let again = app
            .post_with_token(&routes::project_submit(project_id), &json!({}), &alice)
            .await;
        assert_eq!(again.status, 200);
        assert_eq!(again.body["status"], "submitted");

        let edit = app
            .patch_with_token(
                &routes::project(project_id),
                &json!({"description": "Now with summaries"}),
                &alice,
            )
            .await;
        assert_eq!(edit.status, 200, "{}", edit.text);
        assert_eq!(edit.body["status"], "submitted");

        let clear = app
            .patch_with_token(&routes::project(project_id), &json!({"repo_url": null}), &alice)
            .await;
        assert_eq!(clear.status, 400);

        let outsider = app.create_authenticated_user("mallory").await;
        let view = app.get_with_token(&routes::project(project_id), &outsider).await;
        assert_eq!(view.status, 200);
        assert!(view.body["submitted_at"].is_string());
    }

    #[tokio::test]
    async fn drafts_close_once_voting_starts() {
        let (app, alice, project_id) = setup().await;
        app.advance_to("voting").await;

        let res = app
            .patch_with_token(&routes::project(project_id), &json!({"title": "Too late"}), &alice)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "PHASE_CLOSED");
    }
}

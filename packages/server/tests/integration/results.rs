use serde_json::json;

use crate::common::{TestApp, routes};
use crate::voting::showcase;

fn scores(value: i32) -> serde_json::Value {
    json!({
        "scores": {
            "innovation": value,
            "execution": value,
            "impact": value,
            "presentation": value,
        },
        "comments": "Solid demo",
    })
}

mod ranking {
    use super::*;

    #[tokio::test]
    async fn results_rank_by_judge_average_with_a_peoples_choice() {
        let s = showcase(TestApp::spawn().await).await;
        let carol = s.app.create_authenticated_user("carol").await;
        let dave = s.app.create_authenticated_user("dave").await;
        let judge = s.app.create_user_with_role("jules", "judge").await;

        s.app.advance_to("voting").await;
        for voter in [&carol, &dave] {
            let res = s
                .app
                .post_with_token(&routes::project_vote(s.beta_project), &json!({}), voter)
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }
        s.app
            .post_with_token(&routes::project_vote(s.alpha_project), &json!({}), &carol)
            .await;

        s.app.advance_to("judging").await;
        s.app
            .put_with_token(&routes::project_score(s.alpha_project), &scores(9), &judge)
            .await;
        s.app
            .put_with_token(&routes::project_score(s.beta_project), &scores(6), &judge)
            .await;

        s.app.advance_to("results").await;
        let res = s.app.get_with_token(routes::RESULTS, &carol).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["phase"], "results");
        let entries = res.body["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["project_id"], s.alpha_project);
        assert_eq!(entries[0]["rank"], 1);
        assert_eq!(entries[0]["average_score"], 36.0);
        assert_eq!(entries[1]["team_name"], "Beta");
        assert_eq!(entries[1]["vote_count"], 2);
        assert_eq!(res.body["peoples_choice"]["project_id"], s.beta_project);
    }

    #[tokio::test]
    async fn results_are_hidden_from_participants_until_published() {
        let s = showcase(TestApp::spawn().await).await;
        s.app.advance_to("judging").await;

        let hidden = s.app.get_with_token(routes::RESULTS, &s.alice).await;
        assert_eq!(hidden.status, 409);
        assert_eq!(hidden.body["code"], "PHASE_CLOSED");

        let early = s.app.get_with_token(routes::RESULTS, s.app.admin_token()).await;
        assert_eq!(early.status, 200, "{}", early.text);
        assert_eq!(early.body["phase"], "judging");
    }

    #[tokio::test]
    async fn unscored_projects_rank_last() {
        let s = showcase(TestApp::spawn().await).await;
        let judge = s.app.create_user_with_role("jules", "judge").await;
        s.app.advance_to("judging").await;
        s.app
            .put_with_token(&routes::project_score(s.beta_project), &scores(2), &judge)
            .await;
        s.app.advance_to("results").await;

        let res = s.app.get_with_token(routes::RESULTS, &s.alice).await;

        let entries = res.body["entries"].as_array().unwrap();
        assert_eq!(entries[0]["project_id"], s.beta_project);
        assert!(entries[1]["average_score"].is_null());
        assert!(res.body["peoples_choice"].is_null());
    }
}

mod analytics {
    use super::*;

    #[tokio::test]
    async fn ambassadors_get_event_analytics() {
        let s = showcase(TestApp::spawn().await).await;
        let ambassador = s.app.create_user_with_role("amy", "ambassador").await;

        let res = s.app.get_with_token(routes::ANALYTICS, &ambassador).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["phase"], "submission");
        // admin, alice, bob, amy
        assert_eq!(res.body["total_users"], 4);
        assert_eq!(res.body["users_by_role"]["participant"], 2);
        assert_eq!(res.body["regular_teams"], 2);
        assert_eq!(res.body["average_team_size"], 1.0);
        assert_eq!(res.body["projects_by_status"]["submitted"], 2);
    }

    #[tokio::test]
    async fn participants_are_denied_analytics() {
        let s = showcase(TestApp::spawn().await).await;

        let res = s.app.get_with_token(routes::ANALYTICS, &s.bob).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}

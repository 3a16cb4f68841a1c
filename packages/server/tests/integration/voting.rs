use serde_json::json;

use ::common::HackdayConfig;

use crate::common::{TestApp, routes};

pub struct Showcase {
    pub app: TestApp,
    pub alice: String,
    pub bob: String,
    pub alpha_project: i32,
    pub beta_project: i32,
}

/// Two teams with submitted projects, left in the submission phase.
pub async fn showcase(app: TestApp) -> Showcase {
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    app.advance_to("team_formation").await;
    let alpha = app.create_team(&alice, "Alpha").await;
    let beta = app.create_team(&bob, "Beta").await;
    app.advance_to("submission").await;
    let alpha_project = app.team_project_id(alpha, &alice).await;
    let beta_project = app.team_project_id(beta, &bob).await;
    app.submit_project(alpha_project, &alice, "Alpha Bot").await;
    app.submit_project(beta_project, &bob, "Beta Board").await;
    Showcase {
        app,
        alice,
        bob,
        alpha_project,
        beta_project,
    }
}

fn full_scores(value: i32) -> serde_json::Value {
    json!({
        "scores": {
            "innovation": value,
            "execution": value,
            "impact": value,
            "presentation": value,
        }
    })
}

mod votes {
    use super::*;

    #[tokio::test]
    async fn participant_votes_and_retracts() {
        let s = showcase(TestApp::spawn().await).await;
        let carol = s.app.create_authenticated_user("carol").await;
        s.app.advance_to("voting").await;

        let vote = s
            .app
            .post_with_token(&routes::project_vote(s.alpha_project), &json!({}), &carol)
            .await;
        assert_eq!(vote.status, 201, "{}", vote.text);
        assert_eq!(vote.body["project_id"], s.alpha_project);

        let mine = s.app.get_with_token(routes::MY_VOTES, &carol).await;
        assert_eq!(mine.body["max_votes"], 5);
        assert_eq!(mine.body["remaining"], 4);

        let retract = s
            .app
            .delete_with_token(&routes::project_vote(s.alpha_project), &carol)
            .await;
        assert_eq!(retract.status, 204);

        let mine = s.app.get_with_token(routes::MY_VOTES, &carol).await;
        assert_eq!(mine.body["remaining"], 5);

        let again = s
            .app
            .delete_with_token(&routes::project_vote(s.alpha_project), &carol)
            .await;
        assert_eq!(again.status, 404);
    }

    #[tokio::test]
    async fn one_vote_per_project() {
        let s = showcase(TestApp::spawn().await).await;
        let carol = s.app.create_authenticated_user("carol").await;
        s.app.advance_to("voting").await;
        let path = routes::project_vote(s.beta_project);

        let first = s.app.post_with_token(&path, &json!({}), &carol).await;
        assert_eq!(first.status, 201);

        let second = s.app.post_with_token(&path, &json!({}), &carol).await;
        assert_eq!(second.status, 409);
        assert_eq!(second.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn nobody_votes_for_their_own_team() {
        let s = showcase(TestApp::spawn().await).await;
        s.app.advance_to("voting").await;

        let res = s
            .app
            .post_with_token(&routes::project_vote(s.alpha_project), &json!({}), &s.alice)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let other = s
            .app
            .post_with_token(&routes::project_vote(s.beta_project), &json!({}), &s.alice)
            .await;
        assert_eq!(other.status, 201, "{}", other.text);
    }

    #[tokio::test]
    async fn judges_cannot_vote() {
        let s = showcase(TestApp::spawn().await).await;
        let judge = s.app.create_user_with_role("jules", "judge").await;
        s.app.advance_to("voting").await;

        let res = s
            .app
            .post_with_token(&routes::project_vote(s.alpha_project), &json!({}), &judge)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn voting_is_closed_outside_the_voting_phase() {
        let s = showcase(TestApp::spawn().await).await;
        let carol = s.app.create_authenticated_user("carol").await;

        let res = s
            .app
            .post_with_token(&routes::project_vote(s.alpha_project), &json!({}), &carol)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "PHASE_CLOSED");
    }

    #[tokio::test]
    async fn vote_limit_is_enforced() {
        let rules = HackdayConfig {
            max_votes_per_user: 1,
            ..HackdayConfig::default()
        };
        let s = showcase(TestApp::spawn_with_rules(rules).await).await;
        let carol = s.app.create_authenticated_user("carol").await;
        s.app.advance_to("voting").await;

        let first = s
            .app
            .post_with_token(&routes::project_vote(s.alpha_project), &json!({}), &carol)
            .await;
        assert_eq!(first.status, 201);

        let second = s
            .app
            .post_with_token(&routes::project_vote(s.beta_project), &json!({}), &carol)
            .await;
        assert_eq!(second.status, 409);
        assert_eq!(second.body["code"], "VOTE_LIMIT_REACHED");
    }

    #[tokio::test]
    async fn concurrent_votes_never_exceed_the_limit() {
        let rules = HackdayConfig {
            max_votes_per_user: 1,
            ..HackdayConfig::default()
        };
        let s = showcase(TestApp::spawn_with_rules(rules).await).await;
        let carol = s.app.create_authenticated_user("carol").await;
        s.app.advance_to("voting").await;

        let alpha = routes::project_vote(s.alpha_project);
        let beta = routes::project_vote(s.beta_project);
        let results = futures::future::join_all([
            s.app.post_with_token(&alpha, &json!({}), &carol),
            s.app.post_with_token(&beta, &json!({}), &carol),
        ])
        .await;

        let created = results.iter().filter(|r| r.status == 201).count();
        assert_eq!(created, 1);
        let mine = s.app.get_with_token(routes::MY_VOTES, &carol).await;
        assert_eq!(mine.body["votes"].as_array().map(Vec::len), Some(1));
    }
}

mod judging {
    use super::*;

    #[tokio::test]
    async fn judge_scores_and_rescores() {
        let s = showcase(TestApp::spawn().await).await;
        let judge = s.app.create_user_with_role("jules", "judge").await;
        s.app.advance_to("judging").await;
        let path = routes::project_score(s.alpha_project);

        let first = s.app.put_with_token(&path, &full_scores(7), &judge).await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["total"], 28);

        let second = s.app.put_with_token(&path, &full_scores(9), &judge).await;
        assert_eq!(second.status, 200);
        assert_eq!(second.body["total"], 36);

        let scores = s
            .app
            .get_with_token(&routes::project_scores(s.alpha_project), &judge)
            .await;
        assert_eq!(scores.status, 200);
        assert_eq!(scores.body.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn scores_must_cover_every_criterion_in_range() {
        let s = showcase(TestApp::spawn().await).await;
        let judge = s.app.create_user_with_role("jules", "judge").await;
        s.app.advance_to("judging").await;
        let path = routes::project_score(s.alpha_project);

        let missing = s
            .app
            .put_with_token(&path, &json!({"scores": {"innovation": 5}}), &judge)
            .await;
        assert_eq!(missing.status, 400);

        let out_of_range = s.app.put_with_token(&path, &full_scores(11), &judge).await;
        assert_eq!(out_of_range.status, 400);
        assert_eq!(out_of_range.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn participants_cannot_score() {
        let s = showcase(TestApp::spawn().await).await;
        s.app.advance_to("judging").await;

        let res = s
            .app
            .put_with_token(&routes::project_score(s.beta_project), &full_scores(10), &s.alice)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn scoring_waits_for_the_judging_phase() {
        let s = showcase(TestApp::spawn().await).await;
        let judge = s.app.create_user_with_role("jules", "judge").await;
        s.app.advance_to("voting").await;

        let res = s
            .app
            .put_with_token(&routes::project_score(s.alpha_project), &full_scores(5), &judge)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "PHASE_CLOSED");
    }

    #[tokio::test]
    async fn judges_see_only_their_own_scores() {
        let s = showcase(TestApp::spawn().await).await;
        let jules = s.app.create_user_with_role("jules", "judge").await;
        let jane = s.app.create_user_with_role("jane", "judge").await;
        s.app.advance_to("judging").await;
        let path = routes::project_score(s.beta_project);
        s.app.put_with_token(&path, &full_scores(6), &jules).await;
        s.app.put_with_token(&path, &full_scores(8), &jane).await;

        let own = s
            .app
            .get_with_token(&routes::project_scores(s.beta_project), &jane)
            .await;
        assert_eq!(own.body.as_array().map(Vec::len), Some(1));
        assert_eq!(own.body[0]["total"], 32);

        let all = s
            .app
            .get_with_token(&routes::project_scores(s.beta_project), s.app.admin_token())
            .await;
        assert_eq!(all.body.as_array().map(Vec::len), Some(2));

        let denied = s
            .app
            .get_with_token(&routes::project_scores(s.beta_project), &s.bob)
            .await;
        assert_eq!(denied.status, 403);
    }
}

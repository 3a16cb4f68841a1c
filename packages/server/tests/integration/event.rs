use serde_json::json;

use crate::common::{TestApp, routes};

mod reading {
    use super::*;

    #[tokio::test]
    async fn event_is_public_and_starts_in_registration() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::EVENT).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "HackDay");
        assert_eq!(res.body["phase"], "registration");
        assert_eq!(res.body["phase_index"], 0);
        assert_eq!(res.body["next_phase"], "team_formation");
    }
}

mod phase_control {
    use super::*;

    #[tokio::test]
    async fn admin_walks_through_every_phase_in_order() {
        let app = TestApp::spawn().await;
        let expected = [
            "team_formation",
            "hacking",
            "submission",
            "voting",
            "judging",
            "results",
        ];

        for phase in expected {
            let res = app
                .post_with_token(routes::EVENT_ADVANCE, &json!({}), app.admin_token())
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.body["event"]["phase"], phase);
        }

        let res = app
            .post_with_token(routes::EVENT_ADVANCE, &json!({}), app.admin_token())
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
        assert_eq!(app.current_phase().await, "results");
    }

    #[tokio::test]
    async fn set_phase_accepts_only_the_current_or_next_phase() {
        let app = TestApp::spawn().await;

        let same = app
            .put_with_token(routes::EVENT_PHASE, &json!({"phase": "registration"}), app.admin_token())
            .await;
        assert_eq!(same.status, 200, "{}", same.text);
        assert_eq!(same.body["event"]["phase"], "registration");

        let skip = app
            .put_with_token(routes::EVENT_PHASE, &json!({"phase": "hacking"}), app.admin_token())
            .await;
        assert_eq!(skip.status, 409);
        assert_eq!(skip.body["code"], "CONFLICT");

        let next = app
            .put_with_token(routes::EVENT_PHASE, &json!({"phase": "team_formation"}), app.admin_token())
            .await;
        assert_eq!(next.status, 200, "{}", next.text);

        let back = app
            .put_with_token(routes::EVENT_PHASE, &json!({"phase": "registration"}), app.admin_token())
            .await;
        assert_eq!(back.status, 409);
    }

    #[tokio::test]
    async fn unknown_phase_name_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .put_with_token(routes::EVENT_PHASE, &json!({"phase": "lunch"}), app.admin_token())
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn non_admins_cannot_change_the_phase() {
        let app = TestApp::spawn().await;
        let judge = app.create_user_with_role("jules", "judge").await;
        let participant = app.create_authenticated_user("alice").await;

        for token in [&judge, &participant] {
            let res = app
                .post_with_token(routes::EVENT_ADVANCE, &json!({}), token)
                .await;
            assert_eq!(res.status, 403);
            assert_eq!(res.body["code"], "PERMISSION_DENIED");
        }
        assert_eq!(app.current_phase().await, "registration");
    }

    #[tokio::test]
    async fn impersonating_admin_grants_phase_control() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::EVENT_ADVANCE))
            .header("Authorization", format!("Bearer {token}"))
            .header("X-Impersonate-Role", "admin")
            .send()
            .await
            .expect("request failed");

        assert_eq!(res.status().as_u16(), 200);
        assert_eq!(app.current_phase().await, "team_formation");
    }
}

mod details {
    use super::*;

    #[tokio::test]
    async fn admin_updates_name_motd_and_dates() {
        let app = TestApp::spawn().await;

        let res = app
            .patch_with_token(
                routes::EVENT,
                &json!({
                    "name": "HackDay Autumn",
                    "motd": "Pizza at 18:00",
                    "starts_at": "2026-10-20T09:00:00Z",
                    "ends_at": "2026-10-21T18:00:00Z",
                }),
                app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "HackDay Autumn");
        assert_eq!(res.body["motd"], "Pizza at 18:00");

        let cleared = app
            .patch_with_token(routes::EVENT, &json!({"ends_at": null}), app.admin_token())
            .await;
        assert_eq!(cleared.status, 200, "{}", cleared.text);
        assert!(cleared.body["ends_at"].is_null());
        assert!(cleared.body["starts_at"].is_string());
    }

    #[tokio::test]
    async fn end_before_start_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .patch_with_token(
                routes::EVENT,
                &json!({
                    "starts_at": "2026-10-21T09:00:00Z",
                    "ends_at": "2026-10-20T09:00:00Z",
                }),
                app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod observers {
    use super::*;

    #[tokio::test]
    async fn entering_hacking_moves_free_agents_into_observers() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let carol = app.create_authenticated_user("carol").await;
        for token in [&alice, &bob] {
            let res = app
                .put_with_token(routes::FREE_AGENT, &json!({"is_free_agent": true}), token)
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
        }

        app.advance_to("team_formation").await;
        app.create_team(&bob, "Rustaceans").await;

        let res = app
            .post_with_token(routes::EVENT_ADVANCE, &json!({}), app.admin_token())
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let alice_id = app.user_id(&alice).await;
        assert_eq!(res.body["auto_assigned"], json!([alice_id]));

        let team = app.get_with_token(routes::MY_TEAM, &alice).await;
        assert_eq!(team.body["kind"], "observers");
        assert!(team.body["captain_id"].is_null());
        assert_eq!(team.body["is_full"], false);

        let carol_team = app.get_with_token(routes::MY_TEAM, &carol).await;
        assert!(carol_team.body.is_null());
    }

    #[tokio::test]
    async fn manual_auto_assign_is_idempotent() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        app.put_with_token(routes::FREE_AGENT, &json!({"is_free_agent": true}), &alice)
            .await;

        let first = app
            .post_with_token(routes::EVENT_AUTO_ASSIGN, &json!({}), app.admin_token())
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["assigned"].as_array().map(Vec::len), Some(1));

        let second = app
            .post_with_token(routes::EVENT_AUTO_ASSIGN, &json!({}), app.admin_token())
            .await;
        assert_eq!(second.status, 200);
        assert_eq!(second.body["assigned"], json!([]));
        assert_eq!(second.body["team"]["id"], first.body["team"]["id"]);
        assert_eq!(second.body["team"]["member_count"], 1);
    }
}

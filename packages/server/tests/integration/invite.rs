use serde_json::json;

use crate::common::{TestApp, routes};

/// Team formation with `alice` captaining "Rustaceans" and `bob` free.
async fn setup() -> (TestApp, String, String, i32) {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    app.advance_to("team_formation").await;
    let team_id = app.create_team(&alice, "Rustaceans").await;
    (app, alice, bob, team_id)
}

mod invites {
    use super::*;

    #[tokio::test]
    async fn invitee_accepts_and_joins() {
        let (app, alice, bob, team_id) = setup().await;
        let bob_id = app.user_id(&bob).await;

        let sent = app
            .post_with_token(
                &routes::team_invites(team_id),
                &json!({"user_id": bob_id, "message": "We need a backend dev!"}),
                &alice,
            )
            .await;
        assert_eq!(sent.status, 201, "{}", sent.text);
        assert_eq!(sent.body["kind"], "invite");
        assert_eq!(sent.body["status"], "pending");
        assert!(sent.body["expires_at"].is_string());

        let accepted = app
            .post_with_token(&routes::invite_accept(sent.id()), &json!({}), &bob)
            .await;
        assert_eq!(accepted.status, 200, "{}", accepted.text);
        assert_eq!(accepted.body["invite"]["status"], "accepted");
        assert_eq!(accepted.body["team"]["member_count"], 2);

        let me = app.get_with_token(routes::ME, &bob).await;
        assert_eq!(me.body["team_id"], team_id);
    }

    #[tokio::test]
    async fn invitee_declines() {
        let (app, alice, bob, team_id) = setup().await;
        let bob_id = app.user_id(&bob).await;
        let sent = app
            .post_with_token(&routes::team_invites(team_id), &json!({"user_id": bob_id}), &alice)
            .await;

        let res = app
            .post_with_token(&routes::invite_decline(sent.id()), &json!({}), &bob)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "declined");

        let again = app
            .post_with_token(&routes::invite_accept(sent.id()), &json!({}), &bob)
            .await;
        assert_eq!(again.status, 409);
        assert_eq!(again.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn only_the_invitee_can_answer() {
        let (app, alice, bob, team_id) = setup().await;
        let carol = app.create_authenticated_user("carol").await;
        let bob_id = app.user_id(&bob).await;
        let sent = app
            .post_with_token(&routes::team_invites(team_id), &json!({"user_id": bob_id}), &alice)
            .await;

        for token in [&carol, &alice] {
            let res = app
                .post_with_token(&routes::invite_accept(sent.id()), &json!({}), token)
                .await;
            assert_eq!(res.status, 403);
            assert_eq!(res.body["code"], "PERMISSION_DENIED");
        }
    }

    #[tokio::test]
    async fn only_the_captain_can_invite() {
        let (app, alice, bob, team_id) = setup().await;
        let carol = app.create_authenticated_user("carol").await;
        let carol_id = app.user_id(&carol).await;
        app.add_member(team_id, &alice, &bob).await;

        let res = app
            .post_with_token(&routes::team_invites(team_id), &json!({"user_id": carol_id}), &bob)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn duplicate_pending_invite_is_rejected() {
        let (app, alice, bob, team_id) = setup().await;
        let bob_id = app.user_id(&bob).await;
        let body = json!({"user_id": bob_id});

        let first = app
            .post_with_token(&routes::team_invites(team_id), &body, &alice)
            .await;
        assert_eq!(first.status, 201);

        let second = app
            .post_with_token(&routes::team_invites(team_id), &body, &alice)
            .await;
        assert_eq!(second.status, 409);
        assert_eq!(second.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn users_on_a_team_cannot_be_invited() {
        let (app, alice, bob, team_id) = setup().await;
        app.create_team(&bob, "Other").await;
        let bob_id = app.user_id(&bob).await;

        let res = app
            .post_with_token(&routes::team_invites(team_id), &json!({"user_id": bob_id}), &alice)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn sender_cancels_and_others_cannot() {
        let (app, alice, bob, team_id) = setup().await;
        let bob_id = app.user_id(&bob).await;
        let sent = app
            .post_with_token(&routes::team_invites(team_id), &json!({"user_id": bob_id}), &alice)
            .await;

        let denied = app.delete_with_token(&routes::invite(sent.id()), &bob).await;
        assert_eq!(denied.status, 403);

        let cancelled = app.delete_with_token(&routes::invite(sent.id()), &alice).await;
        assert_eq!(cancelled.status, 200, "{}", cancelled.text);
        assert_eq!(cancelled.body["status"], "cancelled");
    }
}

mod join_requests {
    use super::*;

    #[tokio::test]
    async fn captain_accepts_a_join_request() {
        let (app, alice, bob, team_id) = setup().await;

        let request = app
            .post_with_token(
                &routes::team_join_requests(team_id),
                &json!({"message": "I can help with the ML pipeline"}),
                &bob,
            )
            .await;
        assert_eq!(request.status, 201, "{}", request.text);
        assert_eq!(request.body["kind"], "join_request");

        let own = app
            .post_with_token(&routes::invite_accept(request.id()), &json!({}), &bob)
            .await;
        assert_eq!(own.status, 403);

        let accepted = app
            .post_with_token(&routes::invite_accept(request.id()), &json!({}), &alice)
            .await;
        assert_eq!(accepted.status, 200, "{}", accepted.text);
        assert_eq!(accepted.body["team"]["member_count"], 2);
    }

    #[tokio::test]
    async fn joining_cancels_other_pending_requests() {
        let (app, alice, bob, team_id) = setup().await;
        let carol = app.create_authenticated_user("carol").await;
        let other_team = app.create_team(&carol, "Other").await;

        let first = app
            .post_with_token(&routes::team_join_requests(team_id), &json!({}), &bob)
            .await;
        let second = app
            .post_with_token(&routes::team_join_requests(other_team), &json!({}), &bob)
            .await;
        assert_eq!(second.status, 201);

        let accepted = app
            .post_with_token(&routes::invite_accept(first.id()), &json!({}), &alice)
            .await;
        assert_eq!(accepted.status, 200, "{}", accepted.text);

        let list = app.get_with_token(routes::INVITES, &bob).await;
        let statuses: Vec<(i64, String)> = list.body["mine"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| {
                (
                    i["id"].as_i64().unwrap(),
                    i["status"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert!(statuses.contains(&(first.id() as i64, "accepted".into())));
        assert!(statuses.contains(&(second.id() as i64, "cancelled".into())));
    }

    #[tokio::test]
    async fn observers_team_does_not_take_join_requests() {
        let (app, _alice, bob, _team_id) = setup().await;
        let carol = app.create_authenticated_user("carol").await;
        app.put_with_token(routes::FREE_AGENT, &json!({"is_free_agent": true}), &carol)
            .await;
        let assigned = app
            .post_with_token(routes::EVENT_AUTO_ASSIGN, &json!({}), app.admin_token())
            .await;
        let observers_id = assigned.body["team"]["id"].as_i64().unwrap() as i32;

        let res = app
            .post_with_token(&routes::team_join_requests(observers_id), &json!({}), &bob)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }
}

mod capacity {
    use super::*;

    #[tokio::test]
    async fn full_team_rejects_invites_and_accepts() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let carol = app.create_authenticated_user("carol").await;
        let dave = app.create_authenticated_user("dave").await;
        app.advance_to("team_formation").await;
        let team = app
            .post_with_token(routes::TEAMS, &json!({"name": "Pair", "max_members": 2}), &alice)
            .await;
        assert_eq!(team.status, 201, "{}", team.text);
        let team_id = team.id();

        let bob_id = app.user_id(&bob).await;
        let carol_id = app.user_id(&carol).await;
        let to_bob = app
            .post_with_token(&routes::team_invites(team_id), &json!({"user_id": bob_id}), &alice)
            .await;
        let to_carol = app
            .post_with_token(&routes::team_invites(team_id), &json!({"user_id": carol_id}), &alice)
            .await;
        assert_eq!(to_carol.status, 201);

        let ok = app
            .post_with_token(&routes::invite_accept(to_bob.id()), &json!({}), &bob)
            .await;
        assert_eq!(ok.status, 200, "{}", ok.text);
        assert_eq!(ok.body["team"]["is_full"], true);

        let full = app
            .post_with_token(&routes::invite_accept(to_carol.id()), &json!({}), &carol)
            .await;
        assert_eq!(full.status, 409);
        assert_eq!(full.body["code"], "TEAM_FULL");

        let dave_id = app.user_id(&dave).await;
        let invite = app
            .post_with_token(&routes::team_invites(team_id), &json!({"user_id": dave_id}), &alice)
            .await;
        assert_eq!(invite.status, 409);
        assert_eq!(invite.body["code"], "TEAM_FULL");
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn captain_sees_team_invites_member_sees_own() {
        let (app, alice, bob, team_id) = setup().await;
        let carol = app.create_authenticated_user("carol").await;
        let bob_id = app.user_id(&bob).await;
        app.post_with_token(&routes::team_invites(team_id), &json!({"user_id": bob_id}), &alice)
            .await;
        app.post_with_token(&routes::team_join_requests(team_id), &json!({}), &carol)
            .await;

        let captain = app.get_with_token(routes::INVITES, &alice).await;
        assert_eq!(captain.status, 200);
        assert_eq!(captain.body["team"].as_array().map(Vec::len), Some(2));

        let invitee = app.get_with_token(routes::INVITES, &bob).await;
        assert_eq!(invitee.body["mine"].as_array().map(Vec::len), Some(1));
        assert_eq!(invitee.body["team"], json!([]));
    }
}

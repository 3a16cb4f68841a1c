use serde_json::json;

use crate::common::{TestApp, routes};

mod profile {
    use super::*;

    #[tokio::test]
    async fn user_updates_display_name_and_skills() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .patch_with_token(
                routes::USERS_ME,
                &json!({"display_name": "Alice W.", "skills": ["Rust", " rust ", "Design"]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["display_name"], "Alice W.");
        assert_eq!(res.body["skills"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn blank_display_name_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .patch_with_token(routes::USERS_ME, &json!({"display_name": "   "}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod free_agents {
    use super::*;

    #[tokio::test]
    async fn opted_in_users_without_a_team_are_listed() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        app.patch_with_token(routes::USERS_ME, &json!({"skills": ["Rust"]}), &alice)
            .await;
        app.patch_with_token(routes::USERS_ME, &json!({"skills": ["Design"]}), &bob)
            .await;
        for token in [&alice, &bob] {
            let res = app
                .put_with_token(routes::FREE_AGENT, &json!({"is_free_agent": true}), token)
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.body["is_free_agent"], true);
        }

        let all = app.get_with_token(routes::FREE_AGENTS, &alice).await;
        assert_eq!(all.status, 200);
        assert_eq!(all.body.as_array().map(Vec::len), Some(2));

        let rust = app
            .get_with_token(&format!("{}?skill=rust", routes::FREE_AGENTS), &alice)
            .await;
        assert_eq!(rust.status, 200);
        let names: Vec<&str> = rust
            .body
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|u| u["username"].as_str())
            .collect();
        assert_eq!(names, ["alice"]);
    }

    #[tokio::test]
    async fn free_agent_toggle_closes_once_hacking_starts() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        app.advance_to("hacking").await;

        let res = app
            .put_with_token(routes::FREE_AGENT, &json!({"is_free_agent": true}), &alice)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "PHASE_CLOSED");
    }
}

mod roles {
    use super::*;

    #[tokio::test]
    async fn admin_grants_a_role_that_applies_immediately() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("jules").await;
        let id = app.user_id(&token).await;

        let res = app
            .put_with_token(&routes::user_role(id), &json!({"role": "judge"}), app.admin_token())
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["role"], "judge");

        // Same token, new role: roles are re-read on every request.
        let me = app.get_with_token(routes::ME, &token).await;
        assert_eq!(me.body["effective_role"], "judge");
        assert_eq!(me.body["capabilities"]["can_vote"], false);
    }

    #[tokio::test]
    async fn participants_cannot_grant_roles() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.user_id(&alice).await;

        let res = app
            .put_with_token(&routes::user_role(id), &json!({"role": "admin"}), &alice)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn admin_cannot_change_their_own_role() {
        let app = TestApp::spawn().await;
        let admin_id = app.user_id(app.admin_token()).await;

        let res = app
            .put_with_token(
                &routes::user_role(admin_id),
                &json!({"role": "participant"}),
                app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .put_with_token(&routes::user_role(9999), &json!({"role": "judge"}), app.admin_token())
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn user_list_includes_everyone() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        app.create_authenticated_user("bob").await;

        let res = app.get_with_token(routes::USERS, &alice).await;

        assert_eq!(res.status, 200);
        // admin + alice + bob
        assert_eq!(res.body.as_array().map(Vec::len), Some(3));
    }
}

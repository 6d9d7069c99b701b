use serde_json::json;

use crate::common::{TestApp, routes};

mod public_access {
    use super::*;

    #[tokio::test]
    async fn share_link_serves_the_file_without_authentication() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;
        let payload = b"shared content".to_vec();
        let file = app.upload_entry("handout.pdf", &payload, &token).await;
        let share_token = file["share_token"].as_str().unwrap();

        let res = app.get_raw(&routes::shared(share_token), None).await;

        assert_eq!(res.status(), 200);
        let disposition = res
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains("handout.pdf"));
        assert_eq!(res.bytes().await.expect("body"), payload);
    }

    #[tokio::test]
    async fn raw_variant_serves_inline_for_embedding() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;
        let file = app.upload_entry("clip.mp4", b"fake video", &token).await;
        let share_token = file["share_token"].as_str().unwrap();

        let res = app.get_raw(&routes::shared_raw(share_token), None).await;

        assert_eq!(res.status(), 200);
        let disposition = res
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(disposition.starts_with("inline"));
    }

    #[tokio::test]
    async fn download_variant_forces_an_attachment() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;
        let file = app.upload_entry("song.mp3", b"fake audio", &token).await;
        let share_token = file["share_token"].as_str().unwrap();

        let res = app
            .get_raw(&routes::shared_download(share_token), None)
            .await;

        assert_eq!(res.status(), 200);
        let disposition = res
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(disposition.starts_with("attachment"));
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_anon(&routes::shared("no-such-token")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn revoked_link_stops_resolving() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;
        let file = app.upload_entry("secret.txt", b"secret", &token).await;
        let id = file["id"].as_str().unwrap();
        let share_token = file["share_token"].as_str().unwrap();

        let res = app.delete(&routes::file_share(id), &token).await;
        assert_eq!(res.status, 204);

        let public = app.get_anon(&routes::shared(share_token)).await;
        assert_eq!(public.status, 404);

        // The file itself is still there for its owner.
        let own = app.get(&routes::file(id), &token).await;
        assert_eq!(own.status, 200);
        assert_eq!(own.body["is_public"], false);
        assert!(own.body["share_token"].is_null());
    }
}

mod managing {
    use super::*;

    #[tokio::test]
    async fn creating_a_share_link_is_idempotent() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;
        let file = app.upload_entry("stable.txt", b"data", &token).await;
        let id = file["id"].as_str().unwrap();

        let first = app
            .post(&routes::file_share(id), &json!({}), &token)
            .await;
        assert_eq!(first.status, 200);
        assert_eq!(first.body["share_token"], file["share_token"]);

        let second = app
            .post(&routes::file_share(id), &json!({}), &token)
            .await;
        assert_eq!(second.body["share_token"], first.body["share_token"]);
    }

    #[tokio::test]
    async fn a_custom_token_can_replace_the_generated_one() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;
        let file = app.upload_entry("launch.png", b"\x89PNG", &token).await;
        let id = file["id"].as_str().unwrap();
        let old_token = file["share_token"].as_str().unwrap();

        let res = app
            .put(
                &routes::file_share(id),
                &json!({"token": "launch-poster"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["share_token"], "launch-poster");

        let public = app.get_raw(&routes::shared("launch-poster"), None).await;
        assert_eq!(public.status(), 200);

        let stale = app.get_anon(&routes::shared(old_token)).await;
        assert_eq!(stale.status, 404);
    }

    #[tokio::test]
    async fn taken_custom_tokens_are_a_conflict() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;
        let first = app.upload_entry("a.txt", b"a", &token).await;
        let second = app.upload_entry("b.txt", b"b", &token).await;
        let second_token = second["share_token"].as_str().unwrap();

        let res = app
            .put(
                &routes::file_share(first["id"].as_str().unwrap()),
                &json!({"token": "wanted"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200);

        let res = app
            .put(
                &routes::file_share(second["id"].as_str().unwrap()),
                &json!({"token": "wanted"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");

        // The loser keeps its original binding.
        let check = app
            .get(&routes::file(second["id"].as_str().unwrap()), &token)
            .await;
        assert_eq!(check.body["share_token"].as_str(), Some(second_token));
    }

    #[tokio::test]
    async fn malformed_custom_tokens_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;
        let file = app.upload_entry("a.txt", b"a", &token).await;
        let id = file["id"].as_str().unwrap();

        for bad in ["ab", "has space", "umlaut-ü", &"x".repeat(65)] {
            let res = app
                .put(&routes::file_share(id), &json!({"token": bad}), &token)
                .await;
            assert_eq!(res.status, 400, "token {bad:?} should be rejected");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn share_management_requires_ownership() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("alice", "securepass").await;
        let bob = app.create_user(&admin, "bob", "securepass").await;
        let file = app.upload_entry("admins.txt", b"x", &admin).await;
        let id = file["id"].as_str().unwrap();

        let create = app
            .post(&routes::file_share(id), &json!({}), &bob)
            .await;
        assert_eq!(create.status, 403);

        let custom = app
            .put(&routes::file_share(id), &json!({"token": "steal"}), &bob)
            .await;
        assert_eq!(custom.status, 403);

        let revoke = app.delete(&routes::file_share(id), &bob).await;
        assert_eq!(revoke.status, 403);
    }

    #[tokio::test]
    async fn a_revoked_token_value_can_be_reused() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;
        let first = app.upload_entry("a.txt", b"a", &token).await;
        let second = app.upload_entry("b.txt", b"b", &token).await;
        let first_id = first["id"].as_str().unwrap();
        let second_id = second["id"].as_str().unwrap();

        let res = app
            .put(
                &routes::file_share(first_id),
                &json!({"token": "handover"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200);

        let res = app
            .delete(&routes::file_share(first_id), &token)
            .await;
        assert_eq!(res.status, 204);

        let res = app
            .put(
                &routes::file_share(second_id),
                &json!({"token": "handover"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200);

        let public = app.get_raw(&routes::shared("handover"), None).await;
        assert_eq!(public.status(), 200);
        let bytes = public.bytes().await.expect("body");
        assert_eq!(bytes.as_ref(), b"b");
    }
}

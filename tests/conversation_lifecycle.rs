mod common;

use common::{client_as, seed_product, seed_user, start_app, start_postgres};
use testcontainers::clients::Cli;
use uuid::Uuid;

#[tokio::test]
async fn start_is_idempotent_for_same_pair_and_product() {
    let docker = Cli::default();
    let (_pg, pool) = start_postgres(&docker).await;
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;
    let product = seed_product(&pool, bob, "bike").await;
    let base = start_app(pool.clone()).await;

    let body = serde_json::json!({"product_id": product, "receiver_id": bob});
    let first: serde_json::Value = client_as(alice)
        .post(format!("{}/api/v1/conversations", base))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second: serde_json::Value = client_as(alice)
        .post(format!("{}/api/v1/conversations", base))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(first["id"], second["id"]);

    // The receiver starting from the other side also lands on the same row.
    let body = serde_json::json!({"product_id": product, "receiver_id": alice});
    let third: serde_json::Value = client_as(bob)
        .post(format!("{}/api/v1/conversations", base))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["id"], third["id"]);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn concurrent_starts_create_exactly_one_conversation() {
    let docker = Cli::default();
    let (_pg, pool) = start_postgres(&docker).await;
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;
    let product = seed_product(&pool, bob, "sofa").await;
    let base = start_app(pool.clone()).await;

    let body = serde_json::json!({"product_id": product, "receiver_id": bob});
    let a = client_as(alice)
        .post(format!("{}/api/v1/conversations", base))
        .json(&body)
        .send();
    let reverse = serde_json::json!({"product_id": product, "receiver_id": alice});
    let b = client_as(bob)
        .post(format!("{}/api/v1/conversations", base))
        .json(&reverse)
        .send();

    let (ra, rb) = tokio::join!(a, b);
    let va: serde_json::Value = ra.unwrap().json().await.unwrap();
    let vb: serde_json::Value = rb.unwrap().json().await.unwrap();
    assert_eq!(va["id"], vb["id"]);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn start_with_initial_message_seeds_summary_and_ledger() {
    let docker = Cli::default();
    let (_pg, pool) = start_postgres(&docker).await;
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;
    let product = seed_product(&pool, bob, "lamp").await;
    let base = start_app(pool.clone()).await;

    let body = serde_json::json!({
        "product_id": product,
        "receiver_id": bob,
        "initial_message": "Is this still available?"
    });
    let conv: serde_json::Value = client_as(alice)
        .post(format!("{}/api/v1/conversations", base))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(conv["last_message"], "Is this still available?");
    assert_eq!(conv["unread_count"], 1);
    // Projection is caller-relative: alice sees bob as the participant.
    assert_eq!(conv["participant"]["id"], serde_json::json!(bob));
    assert_eq!(conv["product"]["title"], "lamp");

    let conv_id = conv["id"].as_str().unwrap();
    let history: serde_json::Value = client_as(alice)
        .get(format!("{}/api/v1/conversations/{}/messages", base, conv_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let messages = history["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "Is this still available?");
    assert_eq!(messages[0]["isMine"], true);
    assert_eq!(messages[0]["isDelivered"], true);
    assert_eq!(messages[0]["isRead"], false);
    assert_eq!(messages[0]["sender"]["id"], serde_json::json!(alice));
}

#[tokio::test]
async fn start_validates_product_and_receiver() {
    let docker = Cli::default();
    let (_pg, pool) = start_postgres(&docker).await;
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;
    let product = seed_product(&pool, bob, "chair").await;
    let base = start_app(pool.clone()).await;

    // Unknown product
    let body = serde_json::json!({"product_id": Uuid::new_v4(), "receiver_id": bob});
    let resp = client_as(alice)
        .post(format!("{}/api/v1/conversations", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    // Unknown receiver
    let body = serde_json::json!({"product_id": product, "receiver_id": Uuid::new_v4()});
    let resp = client_as(alice)
        .post(format!("{}/api/v1/conversations", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    // Removed listing
    sqlx::query("UPDATE products SET status = 'deleted' WHERE id = $1")
        .bind(product)
        .execute(&pool)
        .await
        .unwrap();
    let body = serde_json::json!({"product_id": product, "receiver_id": bob});
    let resp = client_as(alice)
        .post(format!("{}/api/v1/conversations", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    // Self-conversation
    let body = serde_json::json!({"product_id": product, "receiver_id": alice});
    let resp = client_as(alice)
        .post(format!("{}/api/v1/conversations", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn delete_cascades_to_messages() {
    let docker = Cli::default();
    let (_pg, pool) = start_postgres(&docker).await;
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;
    let product = seed_product(&pool, bob, "desk").await;
    let base = start_app(pool.clone()).await;

    let body = serde_json::json!({"product_id": product, "receiver_id": bob});
    let conv: serde_json::Value = client_as(alice)
        .post(format!("{}/api/v1/conversations", base))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let conv_id = conv["id"].as_str().unwrap().to_string();

    for text in ["one", "two", "three"] {
        let resp = client_as(alice)
            .post(format!("{}/api/v1/conversations/{}/messages", base, conv_id))
            .json(&serde_json::json!({"text": text}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);
    }

    let resp = client_as(bob)
        .delete(format!("{}/api/v1/conversations/{}", base, conv_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    // Absence of the conversation row is the source of truth.
    let resp = client_as(alice)
        .get(format!("{}/api/v1/conversations/{}/messages", base, conv_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphans, 0);
}

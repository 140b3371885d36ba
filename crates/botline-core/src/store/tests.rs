use super::BotStore;
use crate::error::Error;
use crate::types::{BotUpdate, NewBot, Sender};

fn sample_bot(number: &str) -> NewBot {
    NewBot {
        owner: "owner@example.com".to_string(),
        name: "Support Bot".to_string(),
        system_prompt: "You are a helpful support agent.".to_string(),
        language: "en".to_string(),
        whatsapp_number: number.to_string(),
        instance_id: "1101000001".to_string(),
        api_token: "token-1".to_string(),
    }
}

#[tokio::test]
async fn test_create_and_find_by_number() {
    let store = BotStore::in_memory().await.unwrap();
    let bot = store.create_bot(sample_bot("15551234567")).await.unwrap();

    let found = store
        .find_by_whatsapp_number("15551234567")
        .await
        .unwrap()
        .expect("bot should resolve");
    assert_eq!(found.id, bot.id);
    assert_eq!(found.system_prompt, "You are a helpful support agent.");

    assert!(store
        .find_by_whatsapp_number("19998887777")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_duplicate_number_rejected() {
    let store = BotStore::in_memory().await.unwrap();
    store.create_bot(sample_bot("15551234567")).await.unwrap();

    let err = store.create_bot(sample_bot("15551234567")).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateNumber(n) if n == "15551234567"));
}

#[tokio::test]
async fn test_list_scoped_by_owner() {
    let store = BotStore::in_memory().await.unwrap();
    store.create_bot(sample_bot("1111")).await.unwrap();
    let mut other = sample_bot("2222");
    other.owner = "someone-else@example.com".to_string();
    store.create_bot(other).await.unwrap();

    let bots = store.list_bots("owner@example.com").await.unwrap();
    assert_eq!(bots.len(), 1);
    assert_eq!(bots[0].whatsapp_number, "1111");
}

#[tokio::test]
async fn test_partial_update() {
    let store = BotStore::in_memory().await.unwrap();
    let bot = store.create_bot(sample_bot("15551234567")).await.unwrap();

    let updated = store
        .update_bot(
            &bot.id,
            BotUpdate {
                system_prompt: Some("Answer in haiku.".to_string()),
                language: Some("ja".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("bot exists");

    assert_eq!(updated.system_prompt, "Answer in haiku.");
    assert_eq!(updated.language, "ja");
    // Untouched fields survive
    assert_eq!(updated.name, "Support Bot");
    assert_eq!(updated.whatsapp_number, "15551234567");

    assert!(store
        .update_bot("missing", BotUpdate::default())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_delete_removes_history() {
    let store = BotStore::in_memory().await.unwrap();
    let bot = store.create_bot(sample_bot("15551234567")).await.unwrap();
    store
        .append_message(&bot.id, Sender::User, "Hi")
        .await
        .unwrap();
    store
        .append_message(&bot.id, Sender::Bot, "Hello!")
        .await
        .unwrap();

    assert!(store.delete_bot(&bot.id).await.unwrap());
    assert!(store.get_bot(&bot.id).await.unwrap().is_none());
    assert_eq!(store.message_count(&bot.id).await.unwrap(), 0);

    assert!(!store.delete_bot(&bot.id).await.unwrap());
}

#[tokio::test]
async fn test_recent_messages_chronological_with_limit() {
    let store = BotStore::in_memory().await.unwrap();
    let bot = store.create_bot(sample_bot("15551234567")).await.unwrap();

    for i in 0..5 {
        store
            .append_message(&bot.id, Sender::User, &format!("q{i}"))
            .await
            .unwrap();
        store
            .append_message(&bot.id, Sender::Bot, &format!("a{i}"))
            .await
            .unwrap();
    }

    let history = store.recent_messages(&bot.id, 4).await.unwrap();
    assert_eq!(history.len(), 4);
    // Most recent four, oldest first
    let bodies: Vec<&str> = history.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["q3", "a3", "q4", "a4"]);
    assert_eq!(history[0].sender, Sender::User);
    assert_eq!(history[1].sender, Sender::Bot);
}

#[tokio::test]
async fn test_empty_history_is_empty_vec() {
    let store = BotStore::in_memory().await.unwrap();
    let bot = store.create_bot(sample_bot("15551234567")).await.unwrap();
    let history = store.recent_messages(&bot.id, 10).await.unwrap();
    assert!(history.is_empty());
}

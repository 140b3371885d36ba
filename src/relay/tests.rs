use super::*;
use botline_core::NewBot;
use botline_gateway::Result as GatewayResult;
use botline_llm::mock::MockProvider;
use botline_llm::ChatRole;
use serde_json::json;
use std::sync::Mutex;

/// Records sends; optionally fails.
#[derive(Default)]
struct MockGateway {
    sent: Mutex<Vec<(String, String, String)>>,
    fail: std::sync::atomic::AtomicBool,
}

impl MockGateway {
    fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn set_fail(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Gateway for MockGateway {
    async fn send_message(
        &self,
        credentials: &InstanceCredentials,
        destination: &str,
        text: &str,
    ) -> GatewayResult<String> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(botline_gateway::Error::Status(502));
        }
        self.sent.lock().unwrap().push((
            credentials.instance_id.clone(),
            destination.to_string(),
            text.to_string(),
        ));
        Ok("MSG-ID-1".to_string())
    }
}

struct Harness {
    relay: MessageRelay,
    store: BotStore,
    provider: Arc<MockProvider>,
    gateway: Arc<MockGateway>,
}

async fn harness() -> Harness {
    let store = BotStore::in_memory().await.unwrap();
    let provider = Arc::new(MockProvider::new());
    let gateway = Arc::new(MockGateway::default());
    let relay = MessageRelay::new(
        store.clone(),
        provider.clone() as Arc<dyn CompletionProvider>,
        gateway.clone() as Arc<dyn Gateway>,
    );
    Harness {
        relay,
        store,
        provider,
        gateway,
    }
}

async fn seed_bot(store: &BotStore, number: &str) -> Bot {
    store
        .create_bot(NewBot {
            owner: "owner@example.com".to_string(),
            name: "Support".to_string(),
            system_prompt: "You are a concise support agent.".to_string(),
            language: "en".to_string(),
            whatsapp_number: number.to_string(),
            instance_id: "1101000001".to_string(),
            api_token: "gw-token".to_string(),
        })
        .await
        .unwrap()
}

fn text_webhook(receiver: &str, sender: &str, text: &str) -> serde_json::Value {
    json!({
        "typeWebhook": "incomingMessageReceived",
        "instanceData": {"wid": format!("{receiver}@c.us")},
        "senderData": {"sender": format!("{sender}@c.us"), "chatId": format!("{sender}@c.us")},
        "messageData": {"typeMessage": "textMessage", "textMessageData": {"textMessage": text}}
    })
}

#[tokio::test]
async fn test_non_text_payload_is_ignored_with_zero_calls() {
    let h = harness().await;
    seed_bot(&h.store, "15557654321").await;

    let outcome = h
        .relay
        .handle_webhook(json!({
            "typeWebhook": "stateInstanceChanged",
            "stateInstance": "authorized"
        }))
        .await
        .unwrap();

    assert_eq!(outcome, RelayOutcome::Ignored);
    assert_eq!(h.provider.call_count(), 0);
    assert!(h.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_garbage_payload_is_ignored() {
    let h = harness().await;
    let outcome = h
        .relay
        .handle_webhook(json!({"unexpected": ["shape", 42]}))
        .await
        .unwrap();
    assert_eq!(outcome, RelayOutcome::Ignored);
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn test_unclaimed_number_is_success_with_zero_downstream_calls() {
    let h = harness().await;
    // No bot configured at all

    let outcome = h
        .relay
        .handle_webhook(text_webhook("15550000000", "15551234567", "Hello"))
        .await
        .unwrap();

    assert_eq!(outcome, RelayOutcome::Unclaimed);
    assert_eq!(h.provider.call_count(), 0);
    assert!(h.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_empty_history_prompt_is_system_then_user() {
    let h = harness().await;
    let bot = seed_bot(&h.store, "15557654321").await;
    h.provider.push_reply("Hi! How can I help?");

    let outcome = h
        .relay
        .handle_webhook(text_webhook("15557654321", "15551234567", "Hello"))
        .await
        .unwrap();
    assert_eq!(outcome, RelayOutcome::Replied { bot_id: bot.id });

    let requests = h.provider.requests();
    assert_eq!(requests.len(), 1);
    let messages = &requests[0].messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, ChatRole::System);
    assert_eq!(messages[0].content, "You are a concise support agent.");
    assert_eq!(messages[1].role, ChatRole::User);
    assert_eq!(messages[1].content, "Hello");
    assert!((requests[0].temperature - 0.7).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_history_is_chronological_between_system_and_new_message() {
    let h = harness().await;
    let bot = seed_bot(&h.store, "15557654321").await;
    h.store
        .append_message(&bot.id, Sender::User, "What are your hours?")
        .await
        .unwrap();
    h.store
        .append_message(&bot.id, Sender::Bot, "We are open 9-5.")
        .await
        .unwrap();

    h.relay
        .handle_webhook(text_webhook("15557654321", "15551234567", "And on weekends?"))
        .await
        .unwrap();

    let requests = h.provider.requests();
    let messages = &requests[0].messages;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].role, ChatRole::System);
    assert_eq!(
        (messages[1].role, messages[1].content.as_str()),
        (ChatRole::User, "What are your hours?")
    );
    assert_eq!(
        (messages[2].role, messages[2].content.as_str()),
        (ChatRole::Assistant, "We are open 9-5.")
    );
    assert_eq!(
        (messages[3].role, messages[3].content.as_str()),
        (ChatRole::User, "And on weekends?")
    );
}

#[tokio::test]
async fn test_both_sides_persisted_inbound_then_outbound() {
    let h = harness().await;
    let bot = seed_bot(&h.store, "15557654321").await;
    h.provider.push_reply("Sure thing.");

    h.relay
        .handle_webhook(text_webhook("15557654321", "15551234567", "Hello"))
        .await
        .unwrap();

    let history = h.store.recent_messages(&bot.id, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sender, Sender::User);
    assert_eq!(history[0].body, "Hello");
    assert_eq!(history[1].sender, Sender::Bot);
    assert_eq!(history[1].body, "Sure thing.");
}

#[tokio::test]
async fn test_reply_dispatched_to_sender_with_bot_credentials() {
    let h = harness().await;
    seed_bot(&h.store, "15557654321").await;
    h.provider.push_reply("Sure thing.");

    h.relay
        .handle_webhook(text_webhook("15557654321", "15551234567", "Hello"))
        .await
        .unwrap();

    let sent = h.gateway.sent();
    assert_eq!(sent.len(), 1);
    let (instance, destination, text) = &sent[0];
    assert_eq!(instance, "1101000001");
    assert_eq!(destination, "15551234567");
    assert_eq!(text, "Sure thing.");
}

#[tokio::test]
async fn test_provider_failure_propagates() {
    let h = harness().await;
    let bot = seed_bot(&h.store, "15557654321").await;
    h.provider.set_fail(true);

    let err = h
        .relay
        .handle_webhook(text_webhook("15557654321", "15551234567", "Hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::Completion(_)));

    // Nothing persisted, nothing sent
    assert_eq!(h.store.message_count(&bot.id).await.unwrap(), 0);
    assert!(h.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_send_failure_is_error_but_writes_survive() {
    let h = harness().await;
    let bot = seed_bot(&h.store, "15557654321").await;
    h.provider.push_reply("Sure thing.");
    h.gateway.set_fail(true);

    let err = h
        .relay
        .handle_webhook(text_webhook("15557654321", "15551234567", "Hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::Gateway(_)));

    // No compensating rollback: completion ran and both rows are there
    assert_eq!(h.provider.call_count(), 1);
    assert_eq!(h.store.message_count(&bot.id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_missing_credentials_fails_before_any_downstream_work() {
    let h = harness().await;
    let bot = h
        .store
        .create_bot(NewBot {
            owner: "owner@example.com".to_string(),
            name: "Unconnected".to_string(),
            system_prompt: "p".to_string(),
            language: "en".to_string(),
            whatsapp_number: "15557654321".to_string(),
            instance_id: "1101000001".to_string(),
            api_token: String::new(),
        })
        .await
        .unwrap();

    let err = h
        .relay
        .handle_webhook(text_webhook("15557654321", "15551234567", "Hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::MissingCredentials(_)));
    // No completion spent, nothing persisted, nothing sent
    assert_eq!(h.provider.call_count(), 0);
    assert_eq!(h.store.message_count(&bot.id).await.unwrap(), 0);
    assert!(h.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_converse_unknown_bot() {
    let h = harness().await;
    let err = h.relay.converse("missing-id", "Hello").await.unwrap_err();
    assert!(matches!(err, RelayError::BotNotFound(_)));
}

#[tokio::test]
async fn test_converse_persists_without_dispatch() {
    let h = harness().await;
    let bot = seed_bot(&h.store, "15557654321").await;
    h.provider.push_reply("Direct answer.");

    let reply = h.relay.converse(&bot.id, "Ping").await.unwrap();
    assert_eq!(reply, "Direct answer.");
    assert_eq!(h.store.message_count(&bot.id).await.unwrap(), 2);
    assert!(h.gateway.sent().is_empty());
}

#[test]
fn test_mask_for_logging_truncates() {
    let long = "a".repeat(80);
    let masked = mask_for_logging(&long);
    assert!(masked.ends_with("..."));
    assert!(masked.len() < long.len());
    assert_eq!(mask_for_logging("short"), "short");
}

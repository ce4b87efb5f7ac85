//! Integration tests for the message pipeline.
//!
//! The pipeline is driven directly (no runtime, no driver): each test feeds
//! input or frames and checks the returned actions and the gate.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
    time::Duration,
};

use murmur_client::{
    CryptoFailure, CryptoGateway, Environment, GateState, GateTrigger, HistoryGate, Identity,
    MessagePipeline, PipelineAction, PskGateway, RenderedMessageUnit, Session, SessionConfig,
    SharedSecret,
};
use murmur_proto::{
    Envelope, Frame, FrameHeader, HistoryPayload, Opcode, Payload, PlaintextMessage,
};

/// Environment whose random bytes change on every call.
#[derive(Clone, Default)]
struct TestEnv {
    counter: Arc<AtomicU8>,
}

impl Environment for TestEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, _duration: Duration) -> impl Future<Output = ()> + Send {
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let seed = self.counter.fetch_add(1, Ordering::Relaxed);
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = seed.wrapping_add(i as u8);
        }
    }
}

/// Gateway whose encryption always fails.
struct BrokenGateway;

impl CryptoGateway for BrokenGateway {
    fn encrypt(
        &self,
        _secret: &SharedSecret,
        _plaintext: &PlaintextMessage,
    ) -> impl Future<Output = Result<Envelope, CryptoFailure>> + Send {
        std::future::ready(Err(CryptoFailure::Seal(murmur_crypto_error())))
    }

    fn decrypt(
        &self,
        _secret: &SharedSecret,
        _envelope: &Envelope,
    ) -> impl Future<Output = Result<PlaintextMessage, CryptoFailure>> + Send {
        std::future::ready(Err(CryptoFailure::Seal(murmur_crypto_error())))
    }
}

fn murmur_crypto_error() -> murmur_crypto::SealError {
    murmur_crypto::SealError::AuthenticationFailed
}

fn session(name: &str, secret: &str) -> Session {
    let identity = Identity::new(name, SharedSecret::new(secret).unwrap()).unwrap();
    Session::new(identity, SessionConfig::default())
}

fn pipeline(name: &str, secret: &str) -> MessagePipeline<PskGateway<TestEnv>> {
    MessagePipeline::new(
        session(name, secret),
        PskGateway::new(TestEnv::default()),
        HistoryGate::new(),
    )
}

fn sent_frames(actions: &[PipelineAction]) -> Vec<Frame> {
    actions
        .iter()
        .filter_map(|action| match action {
            PipelineAction::Send(frame) => Some(frame.clone()),
            _ => None,
        })
        .collect()
}

fn rendered(actions: &[PipelineAction]) -> Vec<RenderedMessageUnit> {
    actions
        .iter()
        .filter_map(|action| match action {
            PipelineAction::Render(unit) => Some(unit.clone()),
            _ => None,
        })
        .collect()
}

fn history_frame(entries: Vec<Envelope>) -> Frame {
    Payload::History(HistoryPayload::new(entries)).into_frame().unwrap()
}

fn cbor_frame(opcode: Opcode, value: &ciborium::Value) -> Frame {
    let mut body = Vec::new();
    ciborium::into_writer(value, &mut body).unwrap();
    Frame::new(FrameHeader::new(opcode), body)
}

#[tokio::test]
async fn send_then_echo_renders_original() {
    let alice = pipeline("alice", "s1");

    let actions = alice.send_text("hello").await;
    let frames = sent_frames(&actions);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].opcode(), Some(Opcode::Message));

    let echoed = alice.handle_frame(&frames[0]).await;
    assert_eq!(
        echoed,
        vec![
            PipelineAction::Render(RenderedMessageUnit::from_plaintext(PlaintextMessage::new(
                "alice", "hello"
            ))),
            PipelineAction::ScrollToEnd,
        ]
    );
}

#[tokio::test]
async fn empty_input_is_a_no_op() {
    assert!(pipeline("alice", "s1").send_text("").await.is_empty());
}

#[tokio::test]
async fn whitespace_only_text_is_still_sent() {
    let actions = pipeline("alice", "s1").send_text("   ").await;
    assert_eq!(sent_frames(&actions).len(), 1);
}

#[tokio::test]
async fn command_token_is_trimmed_and_not_encrypted() {
    let actions = pipeline("alice", "s1").send_text("!  roll d20  ").await;

    let frames = sent_frames(&actions);
    assert_eq!(frames.len(), 1);
    assert_eq!(Payload::from_frame(&frames[0]).unwrap(), Payload::GetCommand("roll d20".into()));
}

#[tokio::test]
async fn blank_command_is_dropped() {
    assert!(pipeline("alice", "s1").send_text("!").await.is_empty());
    assert!(pipeline("alice", "s1").send_text("!   ").await.is_empty());
}

#[tokio::test]
async fn custom_trigger_is_honored() {
    let config = SessionConfig { command_trigger: '/', ..SessionConfig::default() };
    let identity = Identity::new("alice", SharedSecret::new("s1").unwrap()).unwrap();
    let pipeline = MessagePipeline::new(
        Session::new(identity, config),
        PskGateway::new(TestEnv::default()),
        HistoryGate::new(),
    );

    let command = pipeline.send_text("/help").await;
    let text = pipeline.send_text("!help").await;

    assert_eq!(Payload::from_frame(&sent_frames(&command)[0]).unwrap(), Payload::GetCommand("help".into()));
    assert_eq!(sent_frames(&text)[0].opcode(), Some(Opcode::Message));
}

#[tokio::test]
async fn encryption_failure_notifies_without_sending() {
    let pipeline = MessagePipeline::new(session("alice", "s1"), BrokenGateway, HistoryGate::new());

    let actions = pipeline.send_text("hello").await;

    assert!(sent_frames(&actions).is_empty());
    assert_eq!(
        actions,
        vec![PipelineAction::Notify(
            MessagePipeline::<BrokenGateway>::ENCRYPT_FAILED_NOTICE.to_owned()
        )]
    );
}

#[tokio::test]
async fn oversized_message_notifies_without_sending() {
    let alice = pipeline("alice", "s1");
    let huge = "x".repeat(FrameHeader::MAX_PAYLOAD_SIZE as usize + 1);

    let actions = alice.send_text(&huge).await;

    assert!(sent_frames(&actions).is_empty());
    assert_eq!(
        actions,
        vec![PipelineAction::Notify(
            MessagePipeline::<PskGateway<TestEnv>>::SEND_FAILED_NOTICE.to_owned()
        )]
    );

    // The next message still goes out.
    assert_eq!(sent_frames(&alice.send_text("hello").await).len(), 1);
}

#[tokio::test]
async fn non_text_sender_renders_as_unknown() {
    let plaintext = ciborium::Value::Map(vec![
        (ciborium::Value::Text("username".into()), ciborium::Value::Null),
        (ciborium::Value::Text("msg".into()), ciborium::Value::Text("hi".into())),
    ]);
    let mut encoded = Vec::new();
    ciborium::into_writer(&plaintext, &mut encoded).unwrap();
    let sealed = murmur_crypto::seal(&encoded, b"s1", [1; 16], [2; 24]);
    let frame = Payload::Message(Envelope::from(sealed)).into_frame().unwrap();

    let actions = pipeline("alice", "s1").handle_frame(&frame).await;

    let units = rendered(&actions);
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].to_string(), "unknown : hi");
}

#[tokio::test]
async fn wrong_secret_renders_placeholder() {
    let alice = pipeline("alice", "s1");
    let eve = pipeline("eve", "s2");

    let frame = sent_frames(&alice.send_text("secret plans").await).remove(0);
    let actions = eve.handle_frame(&frame).await;

    assert_eq!(rendered(&actions), vec![RenderedMessageUnit::placeholder()]);
}

#[tokio::test]
async fn malformed_message_payload_renders_placeholder() {
    let frame = cbor_frame(Opcode::Message, &ciborium::Value::Integer(42.into()));

    let actions = pipeline("alice", "s1").handle_frame(&frame).await;

    assert_eq!(rendered(&actions), vec![RenderedMessageUnit::placeholder()]);
}

#[tokio::test]
async fn history_renders_in_order_then_scrolls_once() {
    let alice = pipeline("alice", "s1");
    let mut entries = Vec::new();
    for text in ["a", "b", "c"] {
        let frame = sent_frames(&alice.send_text(text).await).remove(0);
        let Payload::Message(envelope) = Payload::from_frame(&frame).unwrap() else {
            panic!("expected message payload");
        };
        entries.push(envelope);
    }

    let actions = alice.handle_frame(&history_frame(entries)).await;

    let texts: Vec<_> = rendered(&actions).into_iter().map(|u| u.text).collect();
    assert_eq!(texts, vec!["a", "b", "c"]);
    assert_eq!(actions.last(), Some(&PipelineAction::ScrollToEnd));
    assert_eq!(actions.iter().filter(|a| **a == PipelineAction::ScrollToEnd).count(), 1);
    assert_eq!(alice.gate().state(), GateState::Signaled(GateTrigger::HistoryDelivered));
}

#[tokio::test]
async fn empty_history_signals_the_gate() {
    let alice = pipeline("alice", "s1");

    let actions = alice.handle_frame(&history_frame(Vec::new())).await;

    assert!(actions.is_empty());
    assert!(alice.gate().is_signaled());
}

#[tokio::test]
async fn null_history_signals_the_gate() {
    let alice = pipeline("alice", "s1");

    let actions = alice.handle_frame(&cbor_frame(Opcode::History, &ciborium::Value::Null)).await;

    assert!(actions.is_empty());
    assert!(alice.gate().is_signaled());
}

#[tokio::test]
async fn non_sequence_history_signals_the_gate() {
    let alice = pipeline("alice", "s1");
    let value = ciborium::Value::Map(vec![(ciborium::Value::Text("k".into()), ciborium::Value::Null)]);

    let actions = alice.handle_frame(&cbor_frame(Opcode::History, &value)).await;

    assert!(actions.is_empty());
    assert_eq!(alice.gate().state(), GateState::Signaled(GateTrigger::HistoryDelivered));
}

#[tokio::test]
async fn truncated_history_body_signals_the_gate() {
    let alice = pipeline("alice", "s1");
    let frame = Frame::new(FrameHeader::new(Opcode::History), vec![0x9F]);

    alice.handle_frame(&frame).await;

    assert!(alice.gate().is_signaled());
}

#[tokio::test]
async fn second_history_does_not_refire() {
    let alice = pipeline("alice", "s1");
    assert!(alice.gate().fire(GateTrigger::Timeout));

    alice.handle_frame(&history_frame(vec![Envelope::from(vec![1])])).await;

    assert_eq!(alice.gate().state(), GateState::Signaled(GateTrigger::Timeout));
}

#[tokio::test]
async fn history_cleared_clears_and_hides_loading_without_touching_gate() {
    let alice = pipeline("alice", "s1");

    let actions = alice.handle_frame(&Frame::bare(Opcode::HistoryCleared)).await;

    assert_eq!(actions, vec![PipelineAction::ClearMessages, PipelineAction::SetLoading(false)]);
    assert!(!alice.gate().is_signaled());
}

#[tokio::test]
async fn plaintext_without_username_renders_unknown() {
    let alice = pipeline("alice", "s1");
    let env = TestEnv::default();
    let envelope = PskGateway::new(env)
        .encrypt(&SharedSecret::new("s1").unwrap(), &PlaintextMessage::new("", "anon"))
        .await
        .unwrap();

    let actions = alice.handle_message(&envelope).await;

    assert_eq!(rendered(&actions)[0].to_string(), "unknown : anon");
}

#[tokio::test]
async fn unknown_opcode_is_ignored() {
    let mut bytes = FrameHeader::new(Opcode::Message).to_bytes().to_vec();
    bytes[6..8].copy_from_slice(&0x7777u16.to_be_bytes());
    let frame = Frame::decode(&bytes).unwrap();

    assert!(pipeline("alice", "s1").handle_frame(&frame).await.is_empty());
}

//! Integration tests: session against a loopback connection.
//!
//! Inbound events enter as raw wire payloads and are decoded at the
//! transport boundary; outbound actions are pumped through a
//! [`LocalConnection`] so the assertions read what actually reached the
//! wire, not the session's internal action list.

#![allow(clippy::unwrap_used)]

use std::{
    collections::{HashMap, VecDeque},
    ops::Sub,
    time::Duration,
};

use chrono::Utc;
use parley_app::{Session, SessionAction, SessionEvent};
use parley_client::{Connection, EventSubscription, LocalConnection};
use parley_proto::{
    Chat, ChatId, ChatMessage, ClientEvent, Participant, Presence, SenderRef, ServerEvent,
};
use serde_json::json;

/// Virtual instant: milliseconds on a test clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Millis(u64);

impl Sub for Millis {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_millis(self.0 - rhs.0)
    }
}

fn participant(id: &str) -> Participant {
    Participant {
        id: id.into(),
        name: id.to_uppercase(),
        email: None,
        avatar: None,
        status: Presence::Offline,
        last_seen: None,
    }
}

fn direct_chat(id: &str, a: &str, b: &str) -> Chat {
    Chat {
        id: id.into(),
        participants: vec![participant(a), participant(b)],
        last_message: None,
        unread_count: 0,
        is_group: false,
        group_name: None,
        group_avatar: None,
    }
}

fn transcript_message(id: &str, chat_id: &str, sender: &str) -> ChatMessage {
    ChatMessage {
        id: id.into(),
        chat_id: chat_id.into(),
        sender: SenderRef::Id(sender.into()),
        content: format!("msg {id}"),
        timestamp: Utc::now(),
        read: true,
    }
}

/// Execute session actions against the connection, feeding completions and
/// emission failures back in until the queue drains.
fn pump(
    session: &mut Session<Millis>,
    conn: &LocalConnection,
    transcripts: &HashMap<ChatId, Vec<ChatMessage>>,
    actions: Vec<SessionAction>,
) {
    let mut queue = VecDeque::from(actions);
    while let Some(action) = queue.pop_front() {
        match action {
            SessionAction::Emit(event) => {
                if let Err(error) = conn.emit(event) {
                    queue.extend(session.handle(SessionEvent::SendFailed {
                        reason: error.to_string(),
                    }));
                }
            },
            SessionAction::FetchTranscript { chat_id } => {
                let messages = transcripts.get(&chat_id).cloned().unwrap_or_default();
                queue.extend(
                    session.handle(SessionEvent::TranscriptLoaded { chat_id, messages }),
                );
            },
            SessionAction::CreateChat { participant_id } => {
                let chat = direct_chat(&format!("c-{participant_id}"), "u1", &participant_id);
                queue.extend(session.handle(SessionEvent::ChatCreated { chat }));
            },
            SessionAction::CreateGroupChat { .. }
            | SessionAction::Render
            | SessionAction::Shutdown => {},
        }
    }
}

/// Deliver a named wire payload through the connection and into the session.
fn deliver(
    session: &mut Session<Millis>,
    conn: &LocalConnection,
    sub: &mut EventSubscription,
    transcripts: &HashMap<ChatId, Vec<ChatMessage>>,
    name: &str,
    payload: serde_json::Value,
) {
    conn.inject(&ServerEvent::parse(name, payload).unwrap());
    let event = sub.try_next().unwrap();
    let actions = session.handle(SessionEvent::Server(event));
    pump(session, conn, transcripts, actions);
}

fn new_message_payload(id: &str, chat_id: &str, sender: &str, content: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "chatId": chat_id,
        "sender": sender,
        "content": content,
        "timestamp": Utc::now().to_rfc3339(),
    })
}

fn typing_events(sent: &[ClientEvent]) -> Vec<(String, bool)> {
    sent.iter()
        .filter_map(|e| match e {
            ClientEvent::Typing(p) => Some((p.chat_id.clone(), p.is_typing)),
            _ => None,
        })
        .collect()
}

fn read_acks(sent: &[ClientEvent]) -> Vec<String> {
    sent.iter()
        .filter_map(|e| match e {
            ClientEvent::ReadMessage(p) => Some(p.chat_id.clone()),
            _ => None,
        })
        .collect()
}

/// Session with two direct chats, connected through a loopback connection.
fn harness() -> (Session<Millis>, LocalConnection, EventSubscription) {
    let conn = LocalConnection::new();
    let sub = conn.subscribe();

    let mut session = Session::new(participant("u1"));
    let _ = session.handle(SessionEvent::ConnectionChanged { connected: true });
    let _ = session.handle(SessionEvent::SnapshotLoaded {
        chats: vec![direct_chat("c1", "u1", "u2"), direct_chat("c2", "u1", "u3")],
        contacts: vec![participant("u2"), participant("u3")],
    });
    (session, conn, sub)
}

#[test]
fn broadcast_for_active_chat_acks_on_wire() {
    let (mut session, conn, mut sub) = harness();
    let transcripts = HashMap::new();

    let actions = session.handle(SessionEvent::SelectChat { chat_id: "c1".into() });
    pump(&mut session, &conn, &transcripts, actions);
    let _ = conn.take_sent();

    deliver(
        &mut session,
        &conn,
        &mut sub,
        &transcripts,
        "new_message",
        new_message_payload("m1", "c1", "u2", "hi"),
    );

    assert_eq!(read_acks(&conn.take_sent()), ["c1"]);
    assert_eq!(session.transcript().len(), 1);
    assert_eq!(session.unread_count("c1"), 0);
}

#[test]
fn selecting_backlogged_chat_acks_once() {
    let (mut session, conn, mut sub) = harness();
    let transcripts = HashMap::from([(
        "c2".to_string(),
        vec![
            transcript_message("m1", "c2", "u3"),
            transcript_message("m2", "c2", "u3"),
        ],
    )]);

    for id in ["m1", "m2"] {
        deliver(
            &mut session,
            &conn,
            &mut sub,
            &transcripts,
            "new_message",
            new_message_payload(id, "c2", "u3", "backlog"),
        );
    }
    assert_eq!(session.unread_count("c2"), 2);
    let _ = conn.take_sent();

    let actions = session.handle(SessionEvent::SelectChat { chat_id: "c2".into() });
    pump(&mut session, &conn, &transcripts, actions);

    assert_eq!(read_acks(&conn.take_sent()), ["c2"]);
    assert_eq!(session.unread_count("c2"), 0);
    let ids: Vec<_> = session.transcript().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["m1", "m2"]);
}

#[test]
fn typing_burst_puts_one_edge_pair_on_wire() {
    let (mut session, conn, _sub) = harness();
    let transcripts = HashMap::new();

    let actions = session.handle(SessionEvent::SelectChat { chat_id: "c1".into() });
    pump(&mut session, &conn, &transcripts, actions);
    let _ = conn.take_sent();

    for (i, t) in [0u64, 500, 1000].into_iter().enumerate() {
        let actions = session.handle(SessionEvent::InputChanged {
            text: "h".repeat(i + 1),
            now: Millis(t),
        });
        pump(&mut session, &conn, &transcripts, actions);
    }
    let actions = session.handle(SessionEvent::Tick { now: Millis(3000) });
    pump(&mut session, &conn, &transcripts, actions);

    assert_eq!(
        typing_events(&conn.take_sent()),
        [("c1".to_string(), true), ("c1".to_string(), false)]
    );
}

#[test]
fn submitted_message_appears_only_via_echo() {
    let (mut session, conn, mut sub) = harness();
    let transcripts = HashMap::new();

    let actions = session.handle(SessionEvent::SelectChat { chat_id: "c1".into() });
    pump(&mut session, &conn, &transcripts, actions);

    let actions = session
        .handle(SessionEvent::InputChanged { text: "hello".into(), now: Millis(0) });
    pump(&mut session, &conn, &transcripts, actions);
    let actions = session.handle(SessionEvent::Submit { at: Utc::now() });
    pump(&mut session, &conn, &transcripts, actions);

    let sent = conn.take_sent();
    let submitted: Vec<_> = sent
        .iter()
        .filter_map(|e| match e {
            ClientEvent::SendMessage(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].content, "hello");
    assert_eq!(submitted[0].sender, "u1");
    assert!(session.transcript().is_empty());

    // The broadcast echo carries the server-assigned id and lands exactly
    // once.
    deliver(
        &mut session,
        &conn,
        &mut sub,
        &transcripts,
        "new_message",
        new_message_payload("m42", "c1", "u1", "hello"),
    );
    deliver(
        &mut session,
        &conn,
        &mut sub,
        &transcripts,
        "new_message",
        new_message_payload("m42", "c1", "u1", "hello"),
    );

    let ids: Vec<_> = session.transcript().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["m42"]);
}

#[test]
fn presence_change_decodes_through_the_wire() {
    let (mut session, conn, mut sub) = harness();
    let transcripts = HashMap::new();

    deliver(
        &mut session,
        &conn,
        &mut sub,
        &transcripts,
        "user_status",
        json!({ "userId": "u2", "status": "online" }),
    );

    assert_eq!(session.contacts()[0].status, Presence::Online);
}

#[test]
fn dropped_transport_surfaces_send_failure() {
    let (mut session, conn, _sub) = harness();
    let transcripts = HashMap::new();

    let actions = session.handle(SessionEvent::SelectChat { chat_id: "c1".into() });
    pump(&mut session, &conn, &transcripts, actions);

    // The socket drops without the session having been told yet.
    conn.set_connected(false);

    let actions = session
        .handle(SessionEvent::InputChanged { text: "hello".into(), now: Millis(0) });
    pump(&mut session, &conn, &transcripts, actions);
    let actions = session.handle(SessionEvent::Submit { at: Utc::now() });
    pump(&mut session, &conn, &transcripts, actions);

    assert!(conn.take_sent().is_empty());
    assert!(session.notice().is_some());
    assert!(session.input().is_empty());
}

#[test]
fn start_chat_converges_on_one_conversation() {
    let (mut session, conn, _sub) = harness();
    let transcripts = HashMap::new();

    // Unknown contact goes through creation once; afterwards the local
    // direct chat is reused without another round trip.
    let actions = session.handle(SessionEvent::StartChat { contact_id: "u9".into() });
    pump(&mut session, &conn, &transcripts, actions);
    assert!(session.chat("c-u9").is_some());

    let actions = session.handle(SessionEvent::StartChat { contact_id: "u9".into() });
    assert!(!actions.iter().any(|a| matches!(a, SessionAction::CreateChat { .. })));
    pump(&mut session, &conn, &transcripts, actions);

    assert_eq!(session.chats().filter(|c| c.id == "c-u9").count(), 1);
}

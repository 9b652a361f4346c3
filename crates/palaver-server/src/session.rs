//! Per-connection event handling.
//!
//! A connection starts out anonymous. A successful `join` binds it to a user
//! in the [`ConnectionRegistry`]; from then on it may send messages and manage
//! groups. Closing the socket removes it for good.
//!
//! Each connection owns an unbounded channel of [`ServerEvent`]s that the
//! WebSocket layer drains. Delivery is best-effort: events for a connection
//! that has gone away are dropped.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};

use palaver_shared::protocol::{
    ClientEvent, CreateGroupData, Envelope, GroupAnnouncement, GroupDelivery, GroupPayload,
    LeaveGroupData, MembershipData, SendGroupMessageData, SendMessageData, ServerEvent,
};
use palaver_shared::types::{ConnectionId, UserId};
use palaver_store::Conversation;

use crate::dispatch::MessageDispatcher;
use crate::error::{ChatError, ChatResult};
use crate::groups::GroupManager;
use crate::history::HistoryCache;
use crate::registry::ConnectionRegistry;
use crate::store::{ChatStore, IdentityService};

type Outbound = mpsc::UnboundedSender<ServerEvent>;

pub struct SessionCoordinator {
    store: Arc<dyn ChatStore>,
    identity: Arc<dyn IdentityService>,
    registry: ConnectionRegistry,
    history: HistoryCache,
    groups: GroupManager,
    dispatcher: MessageDispatcher,
    /// Every open connection, joined or not.
    outbound: RwLock<HashMap<ConnectionId, Outbound>>,
}

impl SessionCoordinator {
    pub fn new(
        store: Arc<dyn ChatStore>,
        identity: Arc<dyn IdentityService>,
        history: HistoryCache,
    ) -> Self {
        Self {
            groups: GroupManager::new(store.clone()),
            dispatcher: MessageDispatcher::new(store.clone()),
            store,
            identity,
            registry: ConnectionRegistry::new(),
            history,
            outbound: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Number of open connections, including ones that have not joined.
    pub async fn open_connections(&self) -> usize {
        self.outbound.read().await.len()
    }

    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------

    /// Open a new anonymous connection and return the receiving end of its
    /// event channel.
    pub async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let connection = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.outbound.write().await.insert(connection, tx);
        debug!(connection = %connection, "Connection opened");
        (connection, rx)
    }

    /// Close `connection` and tell everyone who is still online.
    pub async fn disconnect(&self, connection: ConnectionId) {
        self.outbound.write().await.remove(&connection);
        let users = self.registry.unregister(connection).await;
        info!(connection = %connection, online = users.len(), "Connection closed");
        self.broadcast(ServerEvent::ActiveUsers(users)).await;
    }

    // ------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------

    /// Parse and handle one text frame.
    pub async fn handle_frame(&self, connection: ConnectionId, text: &str) {
        match ClientEvent::from_json(text) {
            Ok(event) => self.handle(connection, event).await,
            Err(e) => {
                let err = ChatError::MalformedEvent(e.to_string());
                self.report(connection, "unknown", &err).await;
            }
        }
    }

    /// Handle one event. Failures are reported to `connection` only.
    pub async fn handle(&self, connection: ConnectionId, event: ClientEvent) {
        let name = event.name();
        debug!(connection = %connection, event = name, "Handling event");

        let joined = matches!(event, ClientEvent::Join(_))
            || self.registry.identity(connection).await.is_some();
        let result = if joined {
            self.dispatch(connection, event).await
        } else {
            Err(ChatError::NotJoined)
        };

        if let Err(err) = result {
            self.report(connection, name, &err).await;
        }
    }

    async fn dispatch(&self, connection: ConnectionId, event: ClientEvent) -> ChatResult<()> {
        match event {
            ClientEvent::Join(payload) => self.join(connection, payload.user_id).await,
            ClientEvent::SendMessage(Envelope { data }) => self.send_message(data).await,
            ClientEvent::SendGroupMessage(Envelope { data }) => {
                self.send_group_message(data).await
            }
            ClientEvent::CreateGroup(Envelope { data }) => self.create_group(data).await,
            ClientEvent::AddParticipants(Envelope { data }) => {
                let MembershipData {
                    group_id,
                    admin_id,
                    participants,
                } = data;
                let group = self
                    .groups
                    .add_participants(group_id, admin_id, participants)
                    .await?;
                self.send(connection, ServerEvent::ParticipantsAdded(GroupPayload { group }))
                    .await;
                Ok(())
            }
            ClientEvent::RemoveParticipants(Envelope { data }) => {
                let MembershipData {
                    group_id,
                    admin_id,
                    participants,
                } = data;
                let group = self
                    .groups
                    .remove_participants(group_id, admin_id, participants)
                    .await?;
                self.send(connection, ServerEvent::ParticipantsRemoved(GroupPayload { group }))
                    .await;
                Ok(())
            }
            ClientEvent::LeaveGroup(Envelope {
                data: LeaveGroupData { group_id, user_id },
            }) => {
                let group = self.groups.leave_group(group_id, user_id).await?;
                self.send(connection, ServerEvent::LeftGroup(GroupPayload { group }))
                    .await;
                Ok(())
            }
        }
    }

    async fn join(&self, connection: ConnectionId, user: UserId) -> ChatResult<()> {
        let username = self
            .identity
            .resolve_username(user)
            .await?
            .ok_or(ChatError::UnknownUser(user))?;

        // Holding the outbound read lock keeps `disconnect` from slipping in
        // between the liveness check and the registration.
        let users = {
            let outbound = self.outbound.read().await;
            if !outbound.contains_key(&connection) {
                debug!(connection = %connection, user = %user, "Join finished after disconnect");
                return Ok(());
            }
            self.registry.register(connection, user, username).await
        };
        info!(connection = %connection, user = %user, online = users.len(), "User joined");
        self.broadcast(ServerEvent::ActiveUsers(users)).await;

        let history = self.history.get_or_load(self.store.as_ref(), user).await?;
        self.send(connection, ServerEvent::ChatHistory(history)).await;
        Ok(())
    }

    async fn send_message(&self, data: SendMessageData) -> ChatResult<()> {
        let SendMessageData {
            sender_id,
            receiver_id,
            content,
            reply_to,
            media,
        } = data;

        let (message, _) = self
            .dispatcher
            .send_direct(sender_id, receiver_id, content, reply_to, media)
            .await?;

        let delivered = self
            .send_to_user(receiver_id, ServerEvent::NewMessage(message))
            .await;
        debug!(receiver = %receiver_id, delivered, "Direct message fanned out");
        Ok(())
    }

    async fn send_group_message(&self, data: SendGroupMessageData) -> ChatResult<()> {
        let SendGroupMessageData {
            group_id,
            sender_id,
            content,
            media,
        } = data;

        let (message, group) = self
            .dispatcher
            .send_group(group_id, sender_id, content, media)
            .await?;

        let delivery = GroupDelivery::from_message(group.id, &message);
        let delivered = self
            .send_to_members(&group, ServerEvent::NewGroupMessage(delivery))
            .await;
        debug!(group = %group.id, delivered, "Group message fanned out");
        Ok(())
    }

    async fn create_group(&self, data: CreateGroupData) -> ChatResult<()> {
        let CreateGroupData {
            group_name,
            participants,
            group_admin,
            group_photo,
        } = data;

        let group = self
            .groups
            .create_group(group_admin, group_name, participants, group_photo)
            .await?;

        let announcement = GroupAnnouncement::from(&group);
        self.send_to_members(&group, ServerEvent::NewGroup(announcement))
            .await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------

    async fn report(&self, connection: ConnectionId, event: &str, err: &ChatError) {
        match err {
            ChatError::Store(cause) => {
                error!(connection = %connection, event, error = %cause, "Storage failure")
            }
            _ => warn!(
                connection = %connection,
                event,
                kind = err.kind(),
                error = %err,
                "Event rejected"
            ),
        }
        self.send(connection, ServerEvent::error(err.client_message()))
            .await;
    }

    async fn send(&self, connection: ConnectionId, event: ServerEvent) -> bool {
        let outbound = self.outbound.read().await;
        match outbound.get(&connection) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Send to every live connection of `user`. Returns how many accepted it.
    async fn send_to_user(&self, user: UserId, event: ServerEvent) -> usize {
        let connections = self.registry.connections_for(user).await;
        let outbound = self.outbound.read().await;
        let mut delivered = 0;
        for tx in connections.iter().filter_map(|c| outbound.get(c)) {
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Send once to each distinct member of `group`.
    async fn send_to_members(&self, group: &Conversation, event: ServerEvent) -> usize {
        let mut delivered = 0;
        for member in group.distinct_participants() {
            delivered += self.send_to_user(member, event.clone()).await;
        }
        delivered
    }

    async fn broadcast(&self, event: ServerEvent) {
        let outbound = self.outbound.read().await;
        for tx in outbound.values() {
            let _ = tx.send(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use palaver_shared::protocol::JoinPayload;
    use palaver_store::User;

    use crate::store::test_support;

    async fn coordinator(names: &[&str], ttl: Duration) -> (SessionCoordinator, Vec<User>) {
        let (store, users) = test_support::seeded(names).await;
        let coordinator = SessionCoordinator::new(store.clone(), store, HistoryCache::new(ttl));
        (coordinator, users)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn errors(events: &[ServerEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                ServerEvent::Error(payload) => Some(payload.message.clone()),
                _ => None,
            })
            .collect()
    }

    async fn join(
        coordinator: &SessionCoordinator,
        user: &User,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let (connection, rx) = coordinator.connect().await;
        coordinator
            .handle(connection, ClientEvent::Join(JoinPayload { user_id: user.id }))
            .await;
        (connection, rx)
    }

    fn direct(sender: UserId, receiver: UserId, content: &str) -> ClientEvent {
        ClientEvent::SendMessage(Envelope::new(SendMessageData {
            sender_id: sender,
            receiver_id: receiver,
            content: content.to_string(),
            reply_to: None,
            media: None,
        }))
    }

    #[tokio::test]
    async fn join_broadcasts_presence_and_returns_history() {
        let (coordinator, users) = coordinator(&["alice", "bob"], Duration::from_secs(60)).await;
        let (_, mut rx_a) = join(&coordinator, &users[0]).await;
        let (_, mut rx_b) = join(&coordinator, &users[1]).await;

        let events_a = drain(&mut rx_a);
        // Own join, own history, then bob's join.
        assert!(matches!(&events_a[0], ServerEvent::ActiveUsers(list) if list.len() == 1));
        assert!(matches!(&events_a[1], ServerEvent::ChatHistory(list) if list.is_empty()));
        assert!(matches!(&events_a[2], ServerEvent::ActiveUsers(list) if list.len() == 2));

        let events_b = drain(&mut rx_b);
        assert_eq!(events_b.len(), 2);
        assert_eq!(coordinator.registry().connection_count().await, 2);
    }

    #[tokio::test]
    async fn unknown_user_cannot_join() {
        let (coordinator, _) = coordinator(&[], Duration::from_secs(60)).await;
        let (connection, mut rx) = coordinator.connect().await;

        coordinator
            .handle(connection, ClientEvent::Join(JoinPayload { user_id: UserId::new() }))
            .await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(errors(&events)[0].starts_with("User not found"));
        assert!(coordinator.registry().identity(connection).await.is_none());
    }

    #[tokio::test]
    async fn events_before_join_are_rejected() {
        let (coordinator, users) = coordinator(&["alice", "bob"], Duration::from_secs(60)).await;
        let (connection, mut rx) = coordinator.connect().await;

        coordinator
            .handle(connection, direct(users[0].id, users[1].id, "early"))
            .await;

        assert_eq!(
            errors(&drain(&mut rx)),
            vec!["Join the chat before sending events".to_string()]
        );
    }

    #[tokio::test]
    async fn malformed_frames_get_an_error() {
        let (coordinator, _) = coordinator(&[], Duration::from_secs(60)).await;
        let (connection, mut rx) = coordinator.connect().await;
        let (_, mut other) = coordinator.connect().await;

        coordinator.handle_frame(connection, "not json").await;
        coordinator
            .handle_frame(connection, r#"{"event":"typing","payload":{}}"#)
            .await;

        let messages = errors(&drain(&mut rx));
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.starts_with("Malformed event")));
        assert!(drain(&mut other).is_empty());
    }

    #[tokio::test]
    async fn direct_message_reaches_receiver() {
        let (coordinator, users) = coordinator(&["alice", "bob"], Duration::from_secs(60)).await;
        let (conn_a, mut rx_a) = join(&coordinator, &users[0]).await;
        let (_, mut rx_b) = join(&coordinator, &users[1]).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        coordinator
            .handle(conn_a, direct(users[0].id, users[1].id, "hi"))
            .await;

        let events = drain(&mut rx_b);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ServerEvent::NewMessage(message) => {
                assert_eq!(message.content, "hi");
                assert_eq!(message.sender_id, users[0].id);
            }
            other => panic!("unexpected event: {}", other.name()),
        }
        assert!(drain(&mut rx_a).is_empty());
    }

    #[tokio::test]
    async fn offline_receiver_gets_message_in_next_history() {
        let (coordinator, users) = coordinator(&["alice", "bob"], Duration::ZERO).await;
        let (conn_a, mut rx_a) = join(&coordinator, &users[0]).await;
        let (conn_b, _rx_b) = join(&coordinator, &users[1]).await;

        coordinator.disconnect(conn_b).await;
        drain(&mut rx_a);

        coordinator
            .handle(conn_a, direct(users[0].id, users[1].id, "are you there?"))
            .await;
        assert!(drain(&mut rx_a).is_empty());

        let (_, mut rx_b) = join(&coordinator, &users[1]).await;
        let history = drain(&mut rx_b)
            .into_iter()
            .find_map(|event| match event {
                ServerEvent::ChatHistory(history) => Some(history),
                _ => None,
            })
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message.content, "are you there?");
    }

    #[tokio::test]
    async fn self_message_reports_error_to_sender_only() {
        let (coordinator, users) = coordinator(&["alice", "bob"], Duration::from_secs(60)).await;
        let (conn_a, mut rx_a) = join(&coordinator, &users[0]).await;
        let (_, mut rx_b) = join(&coordinator, &users[1]).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        coordinator
            .handle(conn_a, direct(users[0].id, users[0].id, "me"))
            .await;

        assert_eq!(
            errors(&drain(&mut rx_a)),
            vec!["You cannot send a message to yourself.".to_string()]
        );
        assert!(drain(&mut rx_b).is_empty());
    }

    #[tokio::test]
    async fn new_group_is_announced_to_online_members() {
        let (coordinator, users) =
            coordinator(&["alice", "bob", "carol", "dave"], Duration::from_secs(60)).await;
        let (conn_a, mut rx_a) = join(&coordinator, &users[0]).await;
        let (_, mut rx_b) = join(&coordinator, &users[1]).await;
        let (_, mut rx_d) = join(&coordinator, &users[3]).await;
        drain(&mut rx_a);
        drain(&mut rx_b);
        drain(&mut rx_d);

        coordinator
            .handle(
                conn_a,
                ClientEvent::CreateGroup(Envelope::new(CreateGroupData {
                    group_name: "Team".into(),
                    participants: vec![users[1].id, users[2].id],
                    group_admin: users[0].id,
                    group_photo: None,
                })),
            )
            .await;

        let announced = drain(&mut rx_b);
        assert_eq!(announced.len(), 1);
        let ServerEvent::NewGroup(group) = &announced[0] else {
            panic!("expected newGroup");
        };
        assert_eq!(group.name.as_deref(), Some("Team"));
        assert_eq!(group.members, vec![users[0].id, users[1].id, users[2].id]);
        assert_eq!(group.admin, vec![users[0].id]);

        // The admin is a member too; outsiders hear nothing.
        assert_eq!(drain(&mut rx_a).len(), 1);
        assert!(drain(&mut rx_d).is_empty());
    }

    #[tokio::test]
    async fn outsider_group_message_is_rejected() {
        let (coordinator, users) =
            coordinator(&["alice", "bob", "dave"], Duration::from_secs(60)).await;
        let group = coordinator
            .groups
            .create_group(users[0].id, "Team".into(), vec![users[1].id], None)
            .await
            .unwrap();

        let (_, mut rx_a) = join(&coordinator, &users[0]).await;
        let (conn_d, mut rx_d) = join(&coordinator, &users[2]).await;
        drain(&mut rx_a);
        drain(&mut rx_d);

        coordinator
            .handle(
                conn_d,
                ClientEvent::SendGroupMessage(Envelope::new(SendGroupMessageData {
                    group_id: group.id,
                    sender_id: users[2].id,
                    content: "let me in".into(),
                    media: None,
                })),
            )
            .await;

        assert_eq!(
            errors(&drain(&mut rx_d)),
            vec!["You are not a participant of this group".to_string()]
        );
        assert!(drain(&mut rx_a).is_empty());
    }

    #[tokio::test]
    async fn group_message_reaches_every_device_once() {
        let (coordinator, users) = coordinator(&["alice", "bob"], Duration::from_secs(60)).await;
        let group = coordinator
            .groups
            .create_group(users[0].id, "Team".into(), vec![users[1].id], None)
            .await
            .unwrap();
        // Bob listed twice.
        coordinator
            .groups
            .add_participants(group.id, users[0].id, vec![users[1].id])
            .await
            .unwrap();

        let (conn_a, mut rx_a) = join(&coordinator, &users[0]).await;
        let (_, mut phone) = join(&coordinator, &users[1]).await;
        let (_, mut laptop) = join(&coordinator, &users[1]).await;
        drain(&mut rx_a);
        drain(&mut phone);
        drain(&mut laptop);

        coordinator
            .handle(
                conn_a,
                ClientEvent::SendGroupMessage(Envelope::new(SendGroupMessageData {
                    group_id: group.id,
                    sender_id: users[0].id,
                    content: "standup".into(),
                    media: None,
                })),
            )
            .await;

        for rx in [&mut rx_a, &mut phone, &mut laptop] {
            let events = drain(rx);
            assert_eq!(events.len(), 1);
            let ServerEvent::NewGroupMessage(delivery) = &events[0] else {
                panic!("expected newGroupMessage");
            };
            assert_eq!(delivery.group_id, group.id);
            assert_eq!(delivery.sender_id, users[0].id);
            assert_eq!(delivery.content, "standup");
        }
    }

    #[tokio::test]
    async fn cached_history_is_served_unchanged() {
        let (coordinator, users) = coordinator(&["alice", "bob"], Duration::from_secs(3600)).await;
        let (conn_x, mut rx_x) = join(&coordinator, &users[0]).await;
        let first = drain(&mut rx_x)
            .into_iter()
            .find_map(|event| match event {
                ServerEvent::ChatHistory(history) => Some(history),
                _ => None,
            })
            .unwrap();
        coordinator.disconnect(conn_x).await;

        let (conn_b, _rx_b) = join(&coordinator, &users[1]).await;
        coordinator
            .handle(conn_b, direct(users[1].id, users[0].id, "missed"))
            .await;

        let (_, mut rx_x) = join(&coordinator, &users[0]).await;
        let second = drain(&mut rx_x)
            .into_iter()
            .find_map(|event| match event {
                ServerEvent::ChatHistory(history) => Some(history),
                _ => None,
            })
            .unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn membership_replies_go_to_requester() {
        let (coordinator, users) =
            coordinator(&["alice", "bob", "carol"], Duration::from_secs(60)).await;
        let (conn_a, mut rx_a) = join(&coordinator, &users[0]).await;
        let (conn_b, mut rx_b) = join(&coordinator, &users[1]).await;

        coordinator
            .handle(
                conn_a,
                ClientEvent::CreateGroup(Envelope::new(CreateGroupData {
                    group_name: "Team".into(),
                    participants: vec![users[1].id],
                    group_admin: users[0].id,
                    group_photo: None,
                })),
            )
            .await;
        let group_id = drain(&mut rx_a)
            .into_iter()
            .find_map(|event| match event {
                ServerEvent::NewGroup(group) => Some(group.id),
                _ => None,
            })
            .unwrap();
        drain(&mut rx_b);

        coordinator
            .handle(
                conn_a,
                ClientEvent::AddParticipants(Envelope::new(MembershipData {
                    group_id,
                    admin_id: users[0].id,
                    participants: vec![users[2].id],
                })),
            )
            .await;
        let events = drain(&mut rx_a);
        let ServerEvent::ParticipantsAdded(GroupPayload { group }) = &events[0] else {
            panic!("expected participantsAdded");
        };
        assert_eq!(group.participants.len(), 3);

        coordinator
            .handle(
                conn_b,
                ClientEvent::RemoveParticipants(Envelope::new(MembershipData {
                    group_id,
                    admin_id: users[1].id,
                    participants: vec![users[2].id],
                })),
            )
            .await;
        assert_eq!(
            errors(&drain(&mut rx_b)),
            vec!["You are not the admin of this group".to_string()]
        );

        coordinator
            .handle(
                conn_b,
                ClientEvent::LeaveGroup(Envelope::new(LeaveGroupData {
                    group_id,
                    user_id: users[1].id,
                })),
            )
            .await;
        let events = drain(&mut rx_b);
        let ServerEvent::LeftGroup(GroupPayload { group }) = &events[0] else {
            panic!("expected leftGroup");
        };
        assert!(!group.is_participant(&users[1].id));
        assert!(drain(&mut rx_a).is_empty());
    }

    #[tokio::test]
    async fn disconnect_updates_presence_for_others() {
        let (coordinator, users) = coordinator(&["alice", "bob"], Duration::from_secs(60)).await;
        let (_, mut rx_a) = join(&coordinator, &users[0]).await;
        let (conn_b, _rx_b) = join(&coordinator, &users[1]).await;
        drain(&mut rx_a);

        coordinator.disconnect(conn_b).await;
        coordinator.disconnect(conn_b).await;

        let events = drain(&mut rx_a);
        assert_eq!(events.len(), 2);
        for event in events {
            let ServerEvent::ActiveUsers(list) = event else {
                panic!("expected active_users");
            };
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].user_id, users[0].id);
        }
        assert_eq!(coordinator.open_connections().await, 1);
    }

    #[tokio::test]
    async fn join_after_disconnect_does_not_register() {
        let (coordinator, users) = coordinator(&["alice", "bob"], Duration::from_secs(60)).await;
        let (_, mut rx_b) = join(&coordinator, &users[1]).await;
        drain(&mut rx_b);

        let (connection, _rx) = coordinator.connect().await;
        coordinator.disconnect(connection).await;
        coordinator
            .handle(connection, ClientEvent::Join(JoinPayload { user_id: users[0].id }))
            .await;

        assert!(coordinator.registry().identity(connection).await.is_none());
        let online: Vec<UserId> = coordinator
            .registry()
            .active_users()
            .await
            .iter()
            .map(|u| u.user_id)
            .collect();
        assert_eq!(online, vec![users[1].id]);

        // Bob only saw the disconnect broadcast, never alice.
        for event in drain(&mut rx_b) {
            if let ServerEvent::ActiveUsers(list) = event {
                assert!(list.iter().all(|u| u.user_id != users[0].id));
            }
        }
    }
}

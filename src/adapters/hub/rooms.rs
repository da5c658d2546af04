//! Collaboration rooms, one per open document.
//!
//! ```text
//! Room: prop-1               Room: prop-2
//! ├── conn-a (alice, s1@4)   └── conn-d (dave, s3@0)
//! └── conn-b (bob,   s2@17)
//! ```
//!
//! Every frame published in a room carries the connection it came from, so
//! each connection can skip its own messages when forwarding.
//!
//! Members are connections, presence is per user: a user with several
//! connections (tabs) in a room is announced once when the first joins and
//! leaves only when the last one closes.

use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::domain::foundation::{DocumentId, SectionId, UserId};
use crate::domain::realtime::{ActiveUser, RealtimeMessage};

/// Server-side identifier of one WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message published to a room.
#[derive(Debug, Clone)]
pub struct RoomFrame {
    pub from: ConnectionId,
    pub message: RealtimeMessage,
}

/// What a newcomer gets back from [`RoomManager::join`].
#[derive(Debug)]
pub struct Joined {
    pub frames: broadcast::Receiver<RoomFrame>,
    /// Everyone who was already in the room.
    pub roster: Vec<ActiveUser>,
}

#[derive(Debug, Clone)]
struct Member {
    user_id: UserId,
    user_name: Option<String>,
    section_id: Option<SectionId>,
    position: usize,
    /// Room tick of the last join or cursor update; newest wins in rosters.
    last_activity: u64,
}

impl Member {
    fn to_active_user(&self) -> ActiveUser {
        ActiveUser {
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
            position: self.position,
            section_id: self.section_id.clone(),
        }
    }
}

#[derive(Debug)]
struct Room {
    sender: broadcast::Sender<RoomFrame>,
    members: HashMap<ConnectionId, Member>,
    tick: u64,
}

impl Room {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn has_user(&self, user_id: &UserId) -> bool {
        self.members.values().any(|member| &member.user_id == user_id)
    }

    /// One entry per user other than `except`, from that user's most
    /// recently active connection, sorted by user id.
    fn roster_excluding(&self, except: &UserId) -> Vec<ActiveUser> {
        let mut latest: HashMap<&UserId, &Member> = HashMap::new();
        for member in self.members.values().filter(|m| &m.user_id != except) {
            latest
                .entry(&member.user_id)
                .and_modify(|current| {
                    if member.last_activity > current.last_activity {
                        *current = member;
                    }
                })
                .or_insert(member);
        }
        let mut roster: Vec<ActiveUser> = latest.into_values().map(Member::to_active_user).collect();
        roster.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        roster
    }
}

/// Registry of rooms and their rosters.
///
/// Rooms are created on first join and removed when the last member leaves.
pub struct RoomManager {
    rooms: RwLock<HashMap<DocumentId, Room>>,
    /// connection → document, for cleanup on disconnect.
    connections: RwLock<HashMap<ConnectionId, DocumentId>>,
    channel_capacity: usize,
}

impl RoomManager {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            connections: RwLock::new(HashMap::new()),
            channel_capacity,
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(256)
    }

    /// Adds a connection to a document's room. The user is announced to the
    /// others unless another of their connections is already there.
    pub async fn join(
        &self,
        document_id: &DocumentId,
        connection_id: ConnectionId,
        user_id: UserId,
        user_name: Option<String>,
    ) -> Joined {
        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(document_id.clone()).or_insert_with(|| {
            let (sender, _) = broadcast::channel(self.channel_capacity);
            Room {
                sender,
                members: HashMap::new(),
                tick: 0,
            }
        });

        let roster = room.roster_excluding(&user_id);
        let already_present = room.has_user(&user_id);
        let last_activity = room.next_tick();

        room.members.insert(
            connection_id,
            Member {
                user_id: user_id.clone(),
                user_name: user_name.clone(),
                section_id: None,
                position: 0,
                last_activity,
            },
        );
        let frames = room.sender.subscribe();
        if already_present {
            tracing::debug!(document_id = %document_id, user_id = %user_id, "Additional connection for user");
        } else {
            let _ = room.sender.send(RoomFrame {
                from: connection_id,
                message: RealtimeMessage::UserJoined { user_id, user_name },
            });
        }
        drop(rooms);

        self.connections
            .write()
            .await
            .insert(connection_id, document_id.clone());

        Joined { frames, roster }
    }

    /// Publishes a client message to the rest of its room.
    ///
    /// The sender's identity is stamped onto the message. Returns `false`
    /// (and publishes nothing) for unknown connections and for message
    /// types clients may not originate.
    pub async fn relay(&self, connection_id: &ConnectionId, message: RealtimeMessage) -> bool {
        if !message.is_client_originated() {
            return false;
        }
        let Some(document_id) = self.connections.read().await.get(connection_id).cloned() else {
            return false;
        };

        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(&document_id) else {
            return false;
        };
        if !room.members.contains_key(connection_id) {
            return false;
        }
        let tick = room.next_tick();
        let Some(member) = room.members.get_mut(connection_id) else {
            return false;
        };

        let message = message.with_sender(member.user_id.clone());
        if let RealtimeMessage::CursorUpdate {
            section_id,
            position,
            ..
        } = &message
        {
            member.section_id = section_id.clone();
            member.position = *position;
            member.last_activity = tick;
        }

        // No other receivers is fine.
        let _ = room.sender.send(RoomFrame {
            from: *connection_id,
            message,
        });
        true
    }

    /// Removes a connection and drops empty rooms. The departure is announced
    /// only when it was the user's last connection in the room.
    pub async fn leave(&self, connection_id: &ConnectionId) {
        let Some(document_id) = self.connections.write().await.remove(connection_id) else {
            return;
        };

        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(&document_id) else {
            return;
        };
        if let Some(member) = room.members.remove(connection_id) {
            if room.has_user(&member.user_id) {
                tracing::debug!(document_id = %document_id, user_id = %member.user_id, "User still connected elsewhere");
            } else {
                let _ = room.sender.send(RoomFrame {
                from: *connection_id,
                    message: RealtimeMessage::UserLeft {
                        user_id: member.user_id,
                    },
                });
            }
        }
        if room.members.is_empty() {
            rooms.remove(&document_id);
            tracing::debug!(document_id = %document_id, "Room closed");
        }
    }

    /// Number of connections in a document's room.
    pub async fn member_count(&self, document_id: &DocumentId) -> usize {
        self.rooms
            .read()
            .await
            .get(document_id)
            .map(|room| room.members.len())
            .unwrap_or(0)
    }

    pub async fn active_rooms(&self) -> Vec<DocumentId> {
        self.rooms.read().await.keys().cloned().collect()
    }

    pub async fn total_connections(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(s: &str) -> DocumentId {
        DocumentId::new(s)
    }

    async fn next_foreign(joined: &mut Joined, me: ConnectionId) -> RealtimeMessage {
        loop {
            let frame = joined.frames.recv().await.unwrap();
            if frame.from != me {
                return frame.message;
            }
        }
    }

    #[tokio::test]
    async fn join_creates_room_and_returns_existing_roster() {
        let manager = RoomManager::default();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        let first = manager.join(&doc("p1"), a, UserId::new("alice"), Some("Alice".into())).await;
        let second = manager.join(&doc("p1"), b, UserId::new("bob"), None).await;

        assert!(first.roster.is_empty());
        assert_eq!(second.roster.len(), 1);
        assert_eq!(second.roster[0].user_id, UserId::new("alice"));
        assert_eq!(second.roster[0].user_name.as_deref(), Some("Alice"));
        assert_eq!(manager.member_count(&doc("p1")).await, 2);
        assert_eq!(manager.active_rooms().await, vec![doc("p1")]);
    }

    #[tokio::test]
    async fn join_is_announced_to_existing_members() {
        let manager = RoomManager::default();
        let a = ConnectionId::new();
        let mut alice = manager.join(&doc("p1"), a, UserId::new("alice"), None).await;

        manager
            .join(&doc("p1"), ConnectionId::new(), UserId::new("bob"), Some("Bob".into()))
            .await;

        assert_eq!(
            next_foreign(&mut alice, a).await,
            RealtimeMessage::UserJoined {
                user_id: UserId::new("bob"),
                user_name: Some("Bob".into()),
            }
        );
    }

    #[tokio::test]
    async fn relay_stamps_sender_and_tracks_cursor() {
        let manager = RoomManager::default();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let mut alice = manager.join(&doc("p1"), a, UserId::new("alice"), None).await;
        manager.join(&doc("p1"), b, UserId::new("bob"), None).await;
        let _ = next_foreign(&mut alice, a).await; // bob joined

        let spoofed = RealtimeMessage::CursorUpdate {
            user_id: UserId::new("mallory"),
            section_id: Some(SectionId::new("s2")),
            position: 17,
        };
        assert!(manager.relay(&b, spoofed).await);

        assert_eq!(
            next_foreign(&mut alice, a).await,
            RealtimeMessage::CursorUpdate {
                user_id: UserId::new("bob"),
                section_id: Some(SectionId::new("s2")),
                position: 17,
            }
        );

        let carol = manager
            .join(&doc("p1"), ConnectionId::new(), UserId::new("carol"), None)
            .await;
        let bob = carol
            .roster
            .iter()
            .find(|u| u.user_id == UserId::new("bob"))
            .unwrap();
        assert_eq!(bob.position, 17);
        assert_eq!(bob.section_id, Some(SectionId::new("s2")));
    }

    #[tokio::test]
    async fn relay_rejects_server_only_messages() {
        let manager = RoomManager::default();
        let a = ConnectionId::new();
        manager.join(&doc("p1"), a, UserId::new("alice"), None).await;

        let forged = RealtimeMessage::UserLeft {
            user_id: UserId::new("bob"),
        };
        assert!(!manager.relay(&a, forged).await);
    }

    #[tokio::test]
    async fn relay_from_unknown_connection_is_dropped() {
        let manager = RoomManager::default();
        let change = RealtimeMessage::ContentChanged {
            user_id: UserId::new("x"),
            section_id: SectionId::new("s1"),
            content: "hi".into(),
        };
        assert!(!manager.relay(&ConnectionId::new(), change).await);
    }

    #[tokio::test]
    async fn leave_announces_departure_and_cleans_up_empty_room() {
        let manager = RoomManager::default();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let mut alice = manager.join(&doc("p1"), a, UserId::new("alice"), None).await;
        manager.join(&doc("p1"), b, UserId::new("bob"), None).await;
        let _ = next_foreign(&mut alice, a).await;

        manager.leave(&b).await;
        assert_eq!(
            next_foreign(&mut alice, a).await,
            RealtimeMessage::UserLeft {
                user_id: UserId::new("bob")
            }
        );
        assert_eq!(manager.member_count(&doc("p1")).await, 1);

        manager.leave(&a).await;
        assert!(manager.active_rooms().await.is_empty());
        assert_eq!(manager.total_connections().await, 0);
    }

    #[tokio::test]
    async fn user_with_two_connections_is_present_until_both_leave() {
        let manager = RoomManager::default();
        let tab1 = ConnectionId::new();
        let tab2 = ConnectionId::new();
        let b = ConnectionId::new();
        manager.join(&doc("p1"), tab1, UserId::new("alice"), Some("Alice".into())).await;
        manager.join(&doc("p1"), tab2, UserId::new("alice"), Some("Alice".into())).await;
        let mut bob = manager.join(&doc("p1"), b, UserId::new("bob"), None).await;

        let users: Vec<&str> = bob.roster.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(users, vec!["alice"]);

        manager.leave(&tab1).await;
        let marker = RealtimeMessage::CursorUpdate {
            user_id: UserId::new("alice"),
            section_id: Some(SectionId::new("s1")),
            position: 3,
        };
        assert!(manager.relay(&tab2, marker.clone()).await);
        // The first thing bob sees is the cursor, not a departure.
        assert_eq!(next_foreign(&mut bob, b).await, marker);

        manager.leave(&tab2).await;
        assert_eq!(
            next_foreign(&mut bob, b).await,
            RealtimeMessage::UserLeft {
                user_id: UserId::new("alice")
            }
        );
    }

    #[tokio::test]
    async fn second_connection_is_not_announced_and_roster_uses_latest_cursor() {
        let manager = RoomManager::default();
        let b = ConnectionId::new();
        let tab1 = ConnectionId::new();
        let tab2 = ConnectionId::new();
        let mut bob = manager.join(&doc("p1"), b, UserId::new("bob"), None).await;
        manager.join(&doc("p1"), tab1, UserId::new("alice"), None).await;
        let _ = next_foreign(&mut bob, b).await; // alice joined

        let second = manager.join(&doc("p1"), tab2, UserId::new("alice"), None).await;
        let in_second: Vec<&str> = second.roster.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(in_second, vec!["bob"]);

        let cursor = RealtimeMessage::CursorUpdate {
            user_id: UserId::new("alice"),
            section_id: Some(SectionId::new("s2")),
            position: 9,
        };
        manager.relay(&tab1, cursor.clone()).await;
        // No UserJoined for the second tab in between.
        assert_eq!(next_foreign(&mut bob, b).await, cursor);

        let carol = manager
            .join(&doc("p1"), ConnectionId::new(), UserId::new("carol"), None)
            .await;
        let alice: Vec<&ActiveUser> = carol
            .roster
            .iter()
            .filter(|u| u.user_id == UserId::new("alice"))
            .collect();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].position, 9);
        assert_eq!(alice[0].section_id, Some(SectionId::new("s2")));
    }

    #[tokio::test]
    async fn rooms_are_isolated_per_document() {
        let manager = RoomManager::default();
        let a = ConnectionId::new();
        manager.join(&doc("p1"), a, UserId::new("alice"), None).await;
        let other = manager
            .join(&doc("p2"), ConnectionId::new(), UserId::new("bob"), None)
            .await;

        assert!(other.roster.is_empty());
        assert_eq!(manager.member_count(&doc("p1")).await, 1);
        assert_eq!(manager.member_count(&doc("p2")).await, 1);
    }
}

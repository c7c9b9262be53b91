//! Room membership registry.
//!
//! Tracks which clients belong to which rooms and provides the member set
//! used for room-scoped delivery.

use std::collections::{HashMap, HashSet};

use crate::domain::ClientId;

/// Maps room names to their member clients.
///
/// Rooms are created implicitly on first join and pruned once their last
/// member leaves. Not synchronised: the owning transport keeps it behind
/// its own lock.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, HashSet<ClientId>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `client` to `room`. Returns `false` if it was already a member.
    pub fn join(&mut self, room: &str, client: ClientId) -> bool {
        self.rooms.entry(room.to_string()).or_default().insert(client)
    }

    /// Removes `client` from `room`. Returns `false` if it was not a member.
    pub fn leave(&mut self, room: &str, client: ClientId) -> bool {
        let Some(members) = self.rooms.get_mut(room) else {
            return false;
        };
        let removed = members.remove(&client);
        if members.is_empty() {
            self.rooms.remove(room);
        }
        removed
    }

    /// Removes `client` from every room in `rooms`.
    pub fn leave_all<'a, I>(&mut self, client: ClientId, rooms: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for room in rooms {
            self.leave(room, client);
        }
    }

    /// Iterates the members of `room` (empty if the room does not exist).
    pub fn members(&self, room: &str) -> impl Iterator<Item = &ClientId> {
        self.rooms.get(room).into_iter().flatten()
    }

    /// Number of rooms with at least one member.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendRequestStatus {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub status: FriendRequestStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub responded_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub enum SendRequestOutcome {
    Sent(FriendRequest),
    UserNotFound,
    AlreadyExists,
}

/// An accepted friendship. Direction does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendEdge {
    pub a: Uuid,
    pub b: Uuid,
}

impl FriendEdge {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        Self { a, b }
    }

    pub fn other(&self, user_id: Uuid) -> Option<Uuid> {
        if self.a == user_id {
            Some(self.b)
        } else if self.b == user_id {
            Some(self.a)
        } else {
            None
        }
    }
}

/// The two-hop friend neighborhood of a requester.
///
/// Built in two passes over flat edge lists: [`FriendNetwork::from_direct_edges`]
/// takes the edges touching the requester, [`FriendNetwork::add_second_degree`]
/// takes the edges touching any direct friend. Anyone already a direct friend, and
/// the requester, is never counted as second degree.
#[derive(Debug, Clone)]
pub struct FriendNetwork {
    requester: Uuid,
    direct: BTreeSet<Uuid>,
    second_degree: BTreeSet<Uuid>,
}

impl FriendNetwork {
    pub fn from_direct_edges(requester: Uuid, edges: &[FriendEdge]) -> Self {
        let direct = edges
            .iter()
            .filter_map(|edge| edge.other(requester))
            .filter(|id| *id != requester)
            .collect();

        Self {
            requester,
            direct,
            second_degree: BTreeSet::new(),
        }
    }

    pub fn add_second_degree(&mut self, edges: &[FriendEdge]) {
        for edge in edges {
            for (near, far) in [(edge.a, edge.b), (edge.b, edge.a)] {
                if self.direct.contains(&near)
                    && far != self.requester
                    && !self.direct.contains(&far)
                {
                    self.second_degree.insert(far);
                }
            }
        }
    }

    pub fn direct(&self) -> &BTreeSet<Uuid> {
        &self.direct
    }

    pub fn second_degree(&self) -> &BTreeSet<Uuid> {
        &self.second_degree
    }

    pub fn direct_ids(&self) -> Vec<Uuid> {
        self.direct.iter().copied().collect()
    }

    /// `{requester} ∪ direct ∪ second degree`, requester first.
    pub fn members(&self) -> Vec<Uuid> {
        let mut members = Vec::with_capacity(1 + self.direct.len() + self.second_degree.len());
        members.push(self.requester);
        members.extend(self.direct.iter().copied());
        members.extend(self.second_degree.iter().copied());
        members
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        user_id == self.requester
            || self.direct.contains(&user_id)
            || self.second_degree.contains(&user_id)
    }
}

use anyhow::Result;
use tracing::debug;
use uuid::Uuid;

use crate::app::friends::FriendService;
use crate::app::posts::PostService;
use crate::domain::friendship::FriendNetwork;
use crate::domain::page::{Page, PageRequest};
use crate::domain::post::Post;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct FeedService {
    friends: FriendService,
    posts: PostService,
}

impl FeedService {
    pub fn new(db: Db) -> Self {
        Self {
            friends: FriendService::new(db.clone()),
            posts: PostService::new(db),
        }
    }

    /// Two flat lookups: edges touching the requester, then edges touching any
    /// direct friend. No recursion past the second hop.
    pub async fn network(&self, user_id: Uuid) -> Result<FriendNetwork> {
        let direct_edges = self.friends.accepted_edges(&[user_id]).await?;
        let mut network = FriendNetwork::from_direct_edges(user_id, &direct_edges);

        let direct_ids = network.direct_ids();
        let second_edges = self.friends.accepted_edges(&direct_ids).await?;
        network.add_second_degree(&second_edges);

        debug!(
            user_id = %user_id,
            direct = network.direct().len(),
            second_degree = network.second_degree().len(),
            "assembled friend network"
        );

        Ok(network)
    }

    pub async fn get_feed(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<(Page<Post>, FriendNetwork)> {
        let network = self.network(user_id).await?;
        let posts = self.posts.list_by_authors(&network.members(), page).await?;
        Ok((posts, network))
    }
}

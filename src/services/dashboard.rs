//! Admin dashboard counts

use serde::Serialize;
use std::sync::Arc;

use crate::backend::repositories::{CommunityRepository, HelpRequestRepository, ResourceRepository};
use crate::backend::{BackendError, Credential};
use crate::models::AdminSession;

/// Row counts shown on the dashboard cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub resources: u64,
    pub community_posts: u64,
    pub help_requests: u64,
}

pub struct DashboardService {
    resources: Arc<dyn ResourceRepository>,
    posts: Arc<dyn CommunityRepository>,
    help_requests: Arc<dyn HelpRequestRepository>,
}

impl DashboardService {
    pub fn new(
        resources: Arc<dyn ResourceRepository>,
        posts: Arc<dyn CommunityRepository>,
        help_requests: Arc<dyn HelpRequestRepository>,
    ) -> Self {
        Self {
            resources,
            posts,
            help_requests,
        }
    }

    /// Count all three tables at once; a failed count shows as zero
    pub async fn stats(&self, session: &AdminSession) -> DashboardStats {
        let credential = Credential::from(session);
        let (resources, posts, help_requests) = tokio::join!(
            self.resources.count(&credential),
            self.posts.count(&credential),
            self.help_requests.count(&credential),
        );

        DashboardStats {
            resources: or_zero("resources", resources),
            community_posts: or_zero("community_feed", posts),
            help_requests: or_zero("help_requests", help_requests),
        }
    }
}

fn or_zero(table: &str, count: Result<u64, BackendError>) -> u64 {
    count.unwrap_or_else(|e| {
        tracing::warn!(table, error = %e, "dashboard count failed");
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{at, sample_post, sample_resource, MemoryHelpRequests, MemoryPosts, MemoryResources};
    use crate::models::{AdminProfile, AuthUser};
    use uuid::Uuid;

    fn session() -> AdminSession {
        let id = Uuid::new_v4();
        AdminSession {
            user: AuthUser { id, email: None },
            profile: AdminProfile {
                id,
                full_name: None,
                email: None,
            },
            access_token: "t".to_string(),
        }
    }

    #[tokio::test]
    async fn test_counts_include_drafts() {
        let resources = MemoryResources::with(vec![
            sample_resource("a", "Self-Care", true, at(1)),
            sample_resource("b", "Self-Care", false, at(2)),
        ]);
        let posts = MemoryPosts::with(vec![sample_post("p", false, at(1))]);
        let service = DashboardService::new(resources, posts, MemoryHelpRequests::new());

        let stats = service.stats(&session()).await;
        assert_eq!(
            stats,
            DashboardStats {
                resources: 2,
                community_posts: 1,
                help_requests: 0
            }
        );
    }

    #[tokio::test]
    async fn test_failed_count_is_zero_others_survive() {
        let resources = MemoryResources::with(vec![sample_resource("a", "Self-Care", true, at(1))]);
        let posts = MemoryPosts::with(vec![sample_post("p", true, at(1))]);
        posts.probe.fail_with("timeout");
        let service = DashboardService::new(resources, posts, MemoryHelpRequests::new());

        let stats = service.stats(&session()).await;
        assert_eq!(stats.resources, 1);
        assert_eq!(stats.community_posts, 0);
    }
}

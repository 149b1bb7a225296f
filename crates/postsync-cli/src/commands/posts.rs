//! Post command handlers

use anyhow::Result;

use postsync_core::{Draft, Post, PostTransport, SyncCoordinator, SyncError, SyncResult};

use crate::output::Output;

/// Fetch and print up to `limit` posts
pub async fn list<T: PostTransport>(
    coordinator: &SyncCoordinator<T>,
    limit: u32,
    output: &Output,
) -> Result<()> {
    if let Err(e) = coordinator.initialize(limit).await {
        output.failure(&e);
        return Err(e.into());
    }

    output.print_posts(&coordinator.items());
    Ok(())
}

/// Create a post and print the server's copy
pub async fn create<T: PostTransport>(
    coordinator: &SyncCoordinator<T>,
    title: String,
    body: String,
    output: &Output,
) -> Result<()> {
    let draft = Draft::new(title, body);

    match submit(coordinator, &draft).await {
        Ok(post) => {
            output.success(&format!("Created post {}", post.id));
            output.print_post(&post);
            Ok(())
        }
        Err(e) => {
            output.failure(&e);
            Err(e.into())
        }
    }
}

/// Submit a draft, loading a minimal list first if needed
///
/// Blank drafts are rejected before any request is made.
async fn submit<T: PostTransport>(
    coordinator: &SyncCoordinator<T>,
    draft: &Draft,
) -> SyncResult<Post> {
    match coordinator.submit_draft(draft).await {
        Err(SyncError::NotReady) => {
            coordinator.initialize(1).await?;
            coordinator.submit_draft(draft).await
        }
        result => result,
    }
}

//! Collection store
//!
//! Holds the ordered post list the coordinator keeps in sync with the
//! remote resource. Newest submissions sit at the front.
//!
//! ## Invariant
//!
//! The list never contains two posts with the same id. `replace_all` keeps
//! the first occurrence of a repeated id, `prepend` updates an existing
//! entry in place.

use std::collections::HashSet;

use crate::models::{Post, PostId};

/// Ordered, id-unique collection of posts
#[derive(Debug, Clone, Default)]
pub struct PostStore {
    items: Vec<Post>,
}

impl PostStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap the stored sequence for a fresh one
    ///
    /// Returns the number of posts kept after removing repeated ids.
    pub fn replace_all(&mut self, items: Vec<Post>) -> usize {
        let mut seen = HashSet::with_capacity(items.len());
        self.items = items
            .into_iter()
            .filter(|post| seen.insert(post.id))
            .collect();
        self.items.len()
    }

    /// Insert a post at the front
    ///
    /// A post whose id is already stored replaces that entry where it is.
    /// Returns true if the post was newly inserted.
    pub fn prepend(&mut self, post: Post) -> bool {
        match self.position(post.id) {
            Some(index) => {
                self.items[index] = post;
                false
            }
            None => {
                self.items.insert(0, post);
                true
            }
        }
    }

    /// Read-only view of the posts, in display order
    pub fn items(&self) -> &[Post] {
        &self.items
    }

    /// Get a post by id
    pub fn get(&self, id: PostId) -> Option<&Post> {
        self.items.iter().find(|post| post.id == id)
    }

    /// Check if a post with this id is stored
    pub fn contains(&self, id: PostId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, id: PostId) -> Option<usize> {
        self.items.iter().position(|post| post.id == id)
    }
}

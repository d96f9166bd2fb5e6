//! Bounded folder ancestry walks.

use std::collections::HashSet;

use tracing::warn;

use crate::drive::{FolderId, MAX_FOLDER_DEPTH};
use crate::store::ObjectDirectory;
use crate::Result;

/// Where a folder sits relative to a candidate ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ancestry {
    /// The folder is the ancestor itself or one of its descendants.
    Within,
    /// The parent chain ends without reaching the ancestor.
    Outside,
    /// The chain repeats a folder or runs past [`MAX_FOLDER_DEPTH`]; nothing can be concluded.
    Unresolved,
}

/// Locate `folder_id` relative to `root_id` by following parent links.
///
/// Follows at most [`MAX_FOLDER_DEPTH`] links. Callers must treat
/// [`Ancestry::Unresolved`] as a refusal.
pub async fn ancestry_of(
    directory: &dyn ObjectDirectory,
    folder_id: FolderId,
    root_id: FolderId,
) -> Result<Ancestry> {
    let mut current = folder_id;
    let mut visited = HashSet::new();

    for _ in 0..=MAX_FOLDER_DEPTH {
        if current == root_id {
            return Ok(Ancestry::Within);
        }
        if !visited.insert(current) {
            warn!(folder_id = %current, "cycle in folder hierarchy");
            return Ok(Ancestry::Unresolved);
        }
        match directory.get_folder(current).await? {
            Some(folder) => match folder.parent_folder_id {
                Some(parent) => current = parent,
                None => return Ok(Ancestry::Outside),
            },
            None => return Ok(Ancestry::Outside),
        }
    }

    warn!(%folder_id, %root_id, "folder hierarchy exceeds maximum depth");
    Ok(Ancestry::Unresolved)
}

/// Number of folders from the top of the tree down to `folder_id`, inclusive.
///
/// `None` if the chain repeats a folder or is longer than [`MAX_FOLDER_DEPTH`].
pub async fn folder_depth(
    directory: &dyn ObjectDirectory,
    folder_id: FolderId,
) -> Result<Option<usize>> {
    let mut current = Some(folder_id);
    let mut visited = HashSet::new();
    let mut depth = 0;

    while let Some(id) = current {
        if depth == MAX_FOLDER_DEPTH || !visited.insert(id) {
            return Ok(None);
        }
        depth += 1;
        current = directory
            .get_folder(id)
            .await?
            .and_then(|folder| folder.parent_folder_id);
    }
    Ok(Some(depth))
}

/// Levels in the subtree rooted at `folder_id`, counting the folder itself.
///
/// `None` if the subtree is deeper than [`MAX_FOLDER_DEPTH`].
pub async fn subtree_height(
    directory: &dyn ObjectDirectory,
    folder_id: FolderId,
) -> Result<Option<usize>> {
    let mut level = vec![folder_id];
    let mut visited = HashSet::from([folder_id]);
    let mut height = 0;

    while !level.is_empty() {
        if height == MAX_FOLDER_DEPTH {
            return Ok(None);
        }
        height += 1;

        let mut next = Vec::new();
        for id in level {
            for child in directory.list_children(id).await?.folders {
                if visited.insert(child.id) {
                    next.push(child.id);
                }
            }
        }
        level = next;
    }
    Ok(Some(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::NewFolder;
    use crate::store::MemoryStore;
    use uuid::Uuid;

    async fn chain(store: &MemoryStore, owner: Uuid, len: usize) -> Vec<FolderId> {
        let mut ids = Vec::with_capacity(len);
        let mut parent = None;
        for i in 0..len {
            let mut folder = NewFolder::new(format!("f{i}"), owner);
            folder.parent_folder_id = parent;
            let folder = store.seed_folder(folder).await;
            parent = Some(folder.id);
            ids.push(folder.id);
        }
        ids
    }

    #[tokio::test]
    async fn test_self_and_descendants() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let root = store.seed_folder(NewFolder::new("root", owner)).await;
        let child = store
            .seed_folder(NewFolder::new("child", owner).with_parent(root.id))
            .await;
        let grandchild = store
            .seed_folder(NewFolder::new("grandchild", owner).with_parent(child.id))
            .await;
        let sibling = store.seed_folder(NewFolder::new("sibling", owner)).await;

        let cases = [
            (root.id, root.id, Ancestry::Within),
            (child.id, root.id, Ancestry::Within),
            (grandchild.id, root.id, Ancestry::Within),
            (root.id, child.id, Ancestry::Outside),
            (sibling.id, root.id, Ancestry::Outside),
            (Uuid::new_v4(), root.id, Ancestry::Outside),
        ];
        for (folder, ancestor, expected) in cases {
            assert_eq!(
                ancestry_of(&store, folder, ancestor).await.unwrap(),
                expected
            );
        }
    }

    #[tokio::test]
    async fn test_cycle_is_unresolved() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let a = store.seed_folder(NewFolder::new("a", owner)).await;
        let b = store
            .seed_folder(NewFolder::new("b", owner).with_parent(a.id))
            .await;
        store.set_folder_parent_raw(a.id, Some(b.id));

        assert_eq!(
            ancestry_of(&store, a.id, Uuid::new_v4()).await.unwrap(),
            Ancestry::Unresolved
        );
        assert_eq!(
            ancestry_of(&store, a.id, b.id).await.unwrap(),
            Ancestry::Within
        );
        assert_eq!(folder_depth(&store, a.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_chain_past_depth_limit_is_unresolved() {
        let store = MemoryStore::new();
        let ids = chain(&store, Uuid::new_v4(), MAX_FOLDER_DEPTH + 5).await;
        let root = ids[0];
        let deepest = ids[ids.len() - 1];

        assert_eq!(
            ancestry_of(&store, deepest, root).await.unwrap(),
            Ancestry::Unresolved
        );
        assert_eq!(folder_depth(&store, deepest).await.unwrap(), None);
        assert_eq!(subtree_height(&store, root).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_depth_and_height() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let ids = chain(&store, owner, 4).await;
        store
            .seed_folder(NewFolder::new("side", owner).with_parent(ids[1]))
            .await;

        assert_eq!(folder_depth(&store, ids[0]).await.unwrap(), Some(1));
        assert_eq!(folder_depth(&store, ids[3]).await.unwrap(), Some(4));
        assert_eq!(subtree_height(&store, ids[0]).await.unwrap(), Some(4));
        assert_eq!(subtree_height(&store, ids[2]).await.unwrap(), Some(2));
        assert_eq!(subtree_height(&store, ids[3]).await.unwrap(), Some(1));

        let full = chain(&store, owner, MAX_FOLDER_DEPTH).await;
        assert_eq!(
            folder_depth(&store, full[MAX_FOLDER_DEPTH - 1]).await.unwrap(),
            Some(MAX_FOLDER_DEPTH)
        );
        assert_eq!(
            subtree_height(&store, full[0]).await.unwrap(),
            Some(MAX_FOLDER_DEPTH)
        );
    }
}

//! Cascading deletion of secret subtrees.

use tracing::debug;

use vaultmgr_common::{path, Error, Result};

use crate::client::VaultClient;
use crate::mount::Mount;

impl VaultClient {
    /// Delete every secret at or beneath `logical`.
    ///
    /// The mount is resolved once; under KV v2 the traversal runs on the
    /// `metadata` segment. Traversal is sequential depth-first and
    /// fail-fast: the first list or delete failure aborts with the
    /// offending wire path in the error. Already-deleted leaves stay
    /// deleted; cascading delete is not atomic.
    pub fn delete_tree(&self, logical: &str) -> Result<()> {
        let mount = Mount::detect(self, logical)?;
        let root = mount.metadata_path(logical);
        debug!("cascading delete under {root}");
        self.delete_cascade(&root)
    }

    fn delete_cascade(&self, current: &str) -> Result<()> {
        let keys = self
            .list(current)
            .map_err(|e| Error::Traversal(format!("listing {current:?}: {e}")))?;

        // Nothing listed: the path is a leaf secret (or already absent),
        // delete it directly. A path with children is never deleted as a
        // unit; the directory structure is implicit in the store.
        let Some(keys) = keys else {
            return self
                .delete_at(current)
                .map_err(|e| Error::Traversal(format!("deleting {current:?}: {e}")));
        };

        for key in keys {
            if key.ends_with('/') {
                let subtree = path::join(current, path::trim_trailing_slash(&key));
                self.delete_cascade(&subtree)?;
            } else {
                let leaf = path::join(current, &key);
                self.delete_at(&leaf)
                    .map_err(|e| Error::Traversal(format!("deleting {leaf:?}: {e}")))?;
            }
        }
        Ok(())
    }
}

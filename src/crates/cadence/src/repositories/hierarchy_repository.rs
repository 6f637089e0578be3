//! Cross-queue hierarchy resolver.
//!
//! Walks the task link graph entirely server-side: one recursive CTE over
//! a `json_each` expansion of the stored `links` column, batched over a
//! root set. Replaces the per-node fetch pattern that degenerated into
//! tens of thousands of queries.

use crate::db::Database;
use crate::error::{CadenceError, Result};
use sqlx::Row;
use std::collections::HashMap;
use std::sync::Arc;

/// Repository for transitive downstream closures.
#[derive(Clone, Debug)]
pub struct HierarchyRepository {
    db: Arc<Database>,
}

impl HierarchyRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Downstream root keys linked from each of the given upstream tasks.
    ///
    /// Follows links of `link_type` (both directions, matching the
    /// tracker's habit of mirroring relates-links) whose target sits in
    /// the downstream queue. One query for the whole key set.
    pub async fn downstream_roots_for(
        &self,
        upstream_keys: &[String],
        link_type: &str,
        downstream_prefix: &str,
    ) -> Result<HashMap<String, Vec<String>>> {
        if upstream_keys.is_empty() {
            return Ok(HashMap::new());
        }
        let keys_json = serde_json::to_string(upstream_keys)
            .map_err(|e| CadenceError::Database(format!("failed to encode keys: {}", e)))?;

        let rows = sqlx::query(
            "SELECT t.key AS key, json_extract(l.value, '$.target_key') AS target
             FROM tasks t, json_each(t.links) AS l
             WHERE t.key IN (SELECT value FROM json_each(?))
               AND json_extract(l.value, '$.type_id') = ?
               AND json_extract(l.value, '$.target_key') LIKE ? || '%'
             ORDER BY t.key",
        )
        .bind(&keys_json)
        .bind(link_type)
        .bind(downstream_prefix)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| CadenceError::Database(format!("failed to load downstream roots: {}", e)))?;

        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let key: String = row.get("key");
            let target: String = row.get("target");
            let targets = result.entry(key).or_default();
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        Ok(result)
    }

    /// Transitive downstream closure for a batched root set.
    ///
    /// One recursive CTE: each root seeds the walk, subtask links of the
    /// configured type and `inward` direction are followed, keys outside
    /// the downstream queue are cut off, and the depth bound guarantees
    /// termination when the link graph carries a cycle. Roots are
    /// included in their own closure when they match the prefix.
    pub async fn downstream_closures(
        &self,
        roots: &[String],
        subtask_link_type: &str,
        downstream_prefix: &str,
        max_depth: u32,
    ) -> Result<HashMap<String, Vec<String>>> {
        if roots.is_empty() {
            return Ok(HashMap::new());
        }
        let roots_json = serde_json::to_string(roots)
            .map_err(|e| CadenceError::Database(format!("failed to encode roots: {}", e)))?;

        let rows = sqlx::query(
            "WITH RECURSIVE walk(root, key, depth) AS (
                 SELECT value, value, 0 FROM json_each(?1)
                 UNION
                 SELECT w.root, t.key, w.depth + 1
                 FROM walk w
                 JOIN tasks t ON t.key LIKE ?3 || '%'
                 WHERE w.depth < ?4
                   AND EXISTS (
                       SELECT 1 FROM json_each(t.links) AS l
                       WHERE json_extract(l.value, '$.type_id') = ?2
                         AND json_extract(l.value, '$.direction') = 'inward'
                         AND json_extract(l.value, '$.target_key') = w.key
                   )
             )
             SELECT DISTINCT root, key FROM walk
             WHERE key LIKE ?3 || '%'
             ORDER BY root, key",
        )
        .bind(&roots_json)
        .bind(subtask_link_type)
        .bind(downstream_prefix)
        .bind(max_depth as i64)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| CadenceError::Database(format!("hierarchy walk failed: {}", e)))?;

        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        // Every requested root gets an entry, empty when nothing matched.
        for root in roots {
            result.entry(root.clone()).or_default();
        }
        for row in rows {
            let root: String = row.get("root");
            let key: String = row.get("key");
            result.entry(root).or_default().push(key);
        }
        Ok(result)
    }
}

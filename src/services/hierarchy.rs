//! Company hierarchy store
//!
//! Tree queries (children, descendants, ancestors) and level maintenance.
//! Level recompute after a re-parent is serialized per subtree root.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::config::CONFIG;
use crate::error::{AppError, Result};
use crate::models::company;
use crate::models::prelude::*;
use crate::state::DbConn;

/// Keyed async locks, one per subtree root, plus one lock for re-parenting.
///
/// A move reads the new parent's level and rewrites a subtree, so concurrent
/// moves take `moves` to keep the whole read-update-recompute step atomic.
#[derive(Clone, Default)]
pub struct SubtreeLocks {
    locks: Arc<parking_lot::Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>,
    moves: Arc<AsyncMutex<()>>,
}

impl SubtreeLocks {
    pub async fn acquire(&self, root_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock();
            map.entry(root_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    pub async fn acquire_moves(&self) -> OwnedMutexGuard<()> {
        self.moves.clone().lock_owned().await
    }
}

/// Result of a level recompute pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecomputeOutcome {
    pub visited: usize,
    pub updated: usize,
    pub cap_hit: bool,
}

#[derive(Clone)]
pub struct HierarchyService {
    db: DbConn,
    max_depth: i32,
    recompute_cap: usize,
    locks: SubtreeLocks,
}

impl HierarchyService {
    pub fn new(db: DbConn, max_depth: i32, recompute_cap: usize) -> Self {
        Self {
            db,
            max_depth: max_depth.max(0),
            recompute_cap: recompute_cap.max(1),
            locks: SubtreeLocks::default(),
        }
    }

    pub fn from_config(db: DbConn) -> Self {
        Self::new(
            db,
            CONFIG.hierarchy.max_depth,
            CONFIG.hierarchy.recompute_cap,
        )
    }

    pub fn db(&self) -> &DbConn {
        &self.db
    }

    /// Held for the duration of a re-parent
    pub async fn lock_moves(&self) -> OwnedMutexGuard<()> {
        self.locks.acquire_moves().await
    }

    pub fn max_depth(&self) -> i32 {
        self.max_depth
    }

    /// Level for a child placed under a parent at `parent_level`, clamped to the max depth
    pub fn level_for_parent(&self, parent_level: i32) -> i32 {
        parent_level.saturating_add(1).min(self.max_depth)
    }

    pub async fn find(&self, id: i64) -> Result<Option<company::Model>> {
        Ok(Company::find_by_id(id).one(&self.db).await?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<company::Model> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Company not found".to_string()))
    }

    pub async fn get_all(&self) -> Result<Vec<company::Model>> {
        Ok(Company::find()
            .order_by_asc(company::Column::Level)
            .order_by_asc(company::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn all_ids(&self) -> Result<Vec<i64>> {
        Ok(self.get_all().await?.into_iter().map(|c| c.id).collect())
    }

    /// Direct children, active or not
    pub async fn get_children(&self, id: i64) -> Result<Vec<company::Model>> {
        Ok(Company::find()
            .filter(company::Column::ParentId.eq(id))
            .order_by_asc(company::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Full subtree below `id` (self excluded), breadth-first, each company once
    pub async fn get_descendants(&self, id: i64) -> Result<Vec<company::Model>> {
        let mut seen: HashSet<i64> = HashSet::from([id]);
        let mut frontier = vec![id];
        let mut out = Vec::new();

        while !frontier.is_empty() {
            let children = Company::find()
                .filter(company::Column::ParentId.is_in(frontier.clone()))
                .order_by_asc(company::Column::Id)
                .all(&self.db)
                .await?;

            frontier.clear();
            for child in children {
                if seen.insert(child.id) {
                    frontier.push(child.id);
                    out.push(child);
                }
            }
        }

        Ok(out)
    }

    pub async fn descendant_ids(&self, id: i64) -> Result<Vec<i64>> {
        Ok(self
            .get_descendants(id)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect())
    }

    /// Path from the parent of `id` up to the root (self excluded)
    pub async fn get_ancestors(&self, id: i64) -> Result<Vec<company::Model>> {
        let start = self.get_by_id(id).await?;
        let mut seen: HashSet<i64> = HashSet::from([start.id]);
        let mut out = Vec::new();
        let mut next = start.parent_id;

        while let Some(parent_id) = next {
            if !seen.insert(parent_id) {
                tracing::warn!(company_id = id, parent_id, "Cycle detected in company ancestry");
                break;
            }
            let Some(parent) = self.find(parent_id).await? else {
                break;
            };
            next = parent.parent_id;
            out.push(parent);
        }

        Ok(out)
    }

    /// True iff `candidate_id` sits somewhere below `ancestor_id`
    pub async fn is_descendant_of(&self, candidate_id: i64, ancestor_id: i64) -> Result<bool> {
        if candidate_id == ancestor_id {
            return Ok(false);
        }

        let mut seen = HashSet::new();
        let mut current = candidate_id;
        loop {
            if !seen.insert(current) {
                return Ok(false);
            }
            let Some(node) = self.find(current).await? else {
                return Ok(false);
            };
            match node.parent_id {
                Some(parent_id) if parent_id == ancestor_id => return Ok(true),
                Some(parent_id) => current = parent_id,
                None => return Ok(false),
            }
        }
    }

    /// Recompute levels below `root_id` as `parent.level + 1` (clamped).
    ///
    /// Worklist of possibly-stale parents; terminates when the queue empties.
    /// The processing cap only trips on corrupt data and is logged.
    pub async fn recompute_subtree_levels(&self, root_id: i64) -> Result<RecomputeOutcome> {
        let _guard = self.locks.acquire(root_id).await;

        let root = self.get_by_id(root_id).await?;
        let mut outcome = RecomputeOutcome::default();
        let mut seen: HashSet<i64> = HashSet::from([root.id]);
        let mut queue: VecDeque<(i64, i32)> = VecDeque::from([(root.id, root.level)]);

        'work: while let Some((parent_id, parent_level)) = queue.pop_front() {
            let children = self.get_children(parent_id).await?;
            for child in children {
                if !seen.insert(child.id) {
                    continue;
                }
                if outcome.visited >= self.recompute_cap {
                    outcome.cap_hit = true;
                    break 'work;
                }
                outcome.visited += 1;

                let expected = self.level_for_parent(parent_level);
                if child.level != expected {
                    Company::update_many()
                        .col_expr(company::Column::Level, Expr::value(expected))
                        .col_expr(company::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
                        .filter(company::Column::Id.eq(child.id))
                        .exec(&self.db)
                        .await?;
                    outcome.updated += 1;
                }
                queue.push_back((child.id, expected));
            }
        }

        if outcome.cap_hit {
            tracing::warn!(
                root_id,
                cap = self.recompute_cap,
                visited = outcome.visited,
                "Level recompute hit its safety cap"
            );
        } else if outcome.updated > 0 {
            tracing::debug!(
                root_id,
                updated = outcome.updated,
                visited = outcome.visited,
                "Recomputed subtree levels"
            );
        }

        Ok(outcome)
    }
}

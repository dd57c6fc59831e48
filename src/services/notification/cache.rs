use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Cached unread count with expiration
#[derive(Clone, Copy, Debug)]
pub struct CachedCount {
    pub count: u64,
    pub expires_at: Instant,
}

/// Cache key: the caller's role (lowercased), user and company
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub role: String,
    pub user_id: i64,
    pub company_id: Option<i64>,
}

/// Short-lived cache for unread counts, keyed per caller.
/// Absorbs bursts of polling; mutations invalidate explicitly.
#[derive(Clone)]
pub struct UnreadCountCache {
    cache: Arc<RwLock<HashMap<CacheKey, CachedCount>>>,
    ttl: Duration,
}

impl UnreadCountCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    pub fn key(role_name: &str, user_id: i64, company_id: Option<i64>) -> CacheKey {
        CacheKey {
            role: role_name.trim().to_lowercase(),
            user_id,
            company_id,
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<u64> {
        let cache = self.cache.read().await;
        cache
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.count)
    }

    pub async fn set(&self, key: CacheKey, count: u64) {
        let mut cache = self.cache.write().await;
        cache.insert(
            key,
            CachedCount {
                count,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop every entry belonging to `user_id`, whatever role or company it was cached under
    pub async fn invalidate_user(&self, user_id: i64) {
        let mut cache = self.cache.write().await;
        cache.retain(|key, _| key.user_id != user_id);
    }

    /// Drop every entry cached for a superadmin-like role
    pub async fn invalidate_roles<'a>(&self, roles: impl IntoIterator<Item = &'a str>) {
        let roles: Vec<String> = roles
            .into_iter()
            .map(|r| r.trim().to_lowercase())
            .collect();
        let mut cache = self.cache.write().await;
        cache.retain(|key, _| !roles.contains(&key.role));
    }

    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalizes_role() {
        let key = UnreadCountCache::key(" SuperAdmin ", 1, None);
        assert_eq!(key.role, "superadmin");
        assert_eq!(key, UnreadCountCache::key("superadmin", 1, None));
        assert_ne!(
            UnreadCountCache::key("admin", 4, Some(9)),
            UnreadCountCache::key("admin", 4, None)
        );
    }

    #[tokio::test]
    async fn test_get_set_and_expiry() {
        let key = UnreadCountCache::key("staff", 1, Some(2));
        let cache = UnreadCountCache::new(0);
        cache.set(key.clone(), 3).await;
        assert_eq!(cache.get(&key).await, None);

        let cache = UnreadCountCache::new(60);
        cache.set(key.clone(), 3).await;
        assert_eq!(cache.get(&key).await, Some(3));
    }

    #[tokio::test]
    async fn test_invalidate_user_matches_user_only() {
        let cache = UnreadCountCache::new(60);
        cache.set(UnreadCountCache::key("staff", 1, Some(11)), 1).await;
        cache.set(UnreadCountCache::key("admin", 11, Some(1)), 2).await;
        cache.set(UnreadCountCache::key("superadmin", 1, None), 3).await;

        cache.invalidate_user(1).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&UnreadCountCache::key("admin", 11, Some(1))).await, Some(2));
    }

    #[tokio::test]
    async fn test_role_names_with_separators() {
        let cache = UnreadCountCache::new(60);
        cache.set(UnreadCountCache::key("ops:lead", 7, Some(3)), 4).await;
        cache.set(UnreadCountCache::key("ops:lead:3", 8, None), 5).await;

        cache.invalidate_user(7).await;
        assert_eq!(cache.get(&UnreadCountCache::key("ops:lead", 7, Some(3))).await, None);
        assert_eq!(cache.get(&UnreadCountCache::key("ops:lead:3", 8, None)).await, Some(5));

        cache.invalidate_roles(["OPS:LEAD:3"]).await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_invalidate_roles() {
        let cache = UnreadCountCache::new(60);
        cache.set(UnreadCountCache::key("superadmin", 1, None), 3).await;
        cache.set(UnreadCountCache::key("administrator", 2, None), 4).await;
        cache.set(UnreadCountCache::key("admin", 3, Some(1)), 5).await;

        cache.invalidate_roles(["superadmin", "administrator"]).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&UnreadCountCache::key("admin", 3, Some(1))).await, Some(5));
    }
}

use crate::models::FormulaProfile;
use crate::services::postgres::{PostgresClient, PostgresError};
use std::sync::Arc;
use std::time::Duration;

/// In-process cache of formula profiles
///
/// Formula reference data only changes when the database is re-seeded, so
/// profiles are kept until the TTL expires. Unknown formula ids are not
/// cached.
pub struct FormulaCache {
    profiles: moka::future::Cache<i64, Arc<FormulaProfile>>,
}

impl FormulaCache {
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        let profiles = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { profiles }
    }

    pub async fn get(&self, formula_id: i64) -> Option<Arc<FormulaProfile>> {
        let hit = self.profiles.get(&formula_id).await;
        if hit.is_some() {
            tracing::trace!("Formula cache hit: {}", formula_id);
        }
        hit
    }

    pub async fn insert(&self, profile: FormulaProfile) -> Arc<FormulaProfile> {
        let profile = Arc::new(profile);
        self.profiles
            .insert(profile.formula.id, Arc::clone(&profile))
            .await;
        profile
    }

    /// Fetch a profile from the cache, loading it from PostgreSQL on a miss
    pub async fn get_or_load(
        &self,
        formula_id: i64,
        postgres: &PostgresClient,
    ) -> Result<Option<Arc<FormulaProfile>>, PostgresError> {
        if let Some(profile) = self.get(formula_id).await {
            return Ok(Some(profile));
        }

        tracing::trace!("Formula cache miss: {}", formula_id);

        match postgres.get_formula_profile(formula_id).await? {
            Some(profile) => Ok(Some(self.insert(profile).await)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Formula;

    fn profile(id: i64) -> FormulaProfile {
        FormulaProfile {
            formula: Formula {
                id,
                name: format!("Formula {}", id),
                category_id: None,
                kcal_per_ml: 1.0,
                lactose_intolerance: None,
                gluten_free: None,
                kosher: None,
                features: None,
                indications: None,
            },
            category: None,
            nutrients: None,
            minerals: None,
            fluids: None,
        }
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let cache = FormulaCache::new(10, 60);

        assert!(cache.get(1).await.is_none());
        cache.insert(profile(1)).await;

        let cached = cache.get(1).await.unwrap();
        assert_eq!(cached.formula.name, "Formula 1");
    }
}

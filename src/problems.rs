/*
 * LeetBot - LeetCode Practice Companion for Discord
 * File Path: src/problems.rs
 * Responsibility: Cache-aside problem fetching over the store and the catalog API
 */

use crate::api::{CatalogClient, CatalogProblem};
use crate::error::Result;
use crate::store::{Difficulty, ProblemBundle, ProblemStore};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ProblemManager {
    store: ProblemStore,
    catalog: CatalogClient,
}

impl ProblemManager {
    pub fn new(store: ProblemStore, catalog: CatalogClient) -> Self {
        Self { store, catalog }
    }

    /// Today's problem. The catalog decides which problem is current; the
    /// store is consulted before persisting so a cached daily costs no writes.
    pub async fn daily(&self) -> Result<ProblemBundle> {
        let fetched = self.catalog.daily().await?;
        if let Some(bundle) = self.store.get(fetched.question_frontend_id).await? {
            return Ok(bundle);
        }
        self.persist(fetched).await
    }

    /// Problem by external id, store first. None when the catalog doesn't
    /// know the id either.
    pub async fn by_id(&self, external_id: i64) -> Result<Option<ProblemBundle>> {
        if let Some(bundle) = self.store.get(external_id).await? {
            return Ok(Some(bundle));
        }
        info!(external_id, "cache miss, fetching problem from catalog");
        match self.catalog.by_id(external_id).await? {
            Some(fetched) => Ok(Some(self.persist(fetched).await?)),
            None => Ok(None),
        }
    }

    /// Random problem matching the filters. Falls back to the catalog when
    /// the local store has nothing matching (e.g. before the first refresh).
    pub async fn random(
        &self,
        difficulty: Option<Difficulty>,
        include_premium: bool,
    ) -> Result<Option<ProblemBundle>> {
        if let Some(bundle) = self.store.random(difficulty, include_premium).await? {
            return Ok(Some(bundle));
        }
        match self.catalog.random(difficulty, include_premium).await? {
            Some(fetched) => Ok(Some(self.persist(fetched).await?)),
            None => Ok(None),
        }
    }

    /// Bulk resynchronization of the whole catalog. Upserts are keyed by the
    /// external id, so re-running (or overlapping with on-demand fetches)
    /// converges to the same state. Returns the number of problems stored.
    pub async fn refresh_all(&self) -> Result<usize> {
        let entries = self.catalog.all_problems().await?;
        let total = entries.len();
        let mut stored = 0usize;
        for entry in entries {
            let external_id = entry.question_frontend_id;
            match self.persist(entry).await {
                Ok(_) => stored += 1,
                Err(err) => warn!(external_id, "skipping catalog entry: {err}"),
            }
        }
        info!(stored, total, "problem cache refreshed");
        Ok(stored)
    }

    pub async fn cached_count(&self) -> Result<i64> {
        self.store.count().await
    }

    async fn persist(&self, fetched: CatalogProblem) -> Result<ProblemBundle> {
        let (record, tag_names) = fetched.into_record()?;
        let problem = self.store.upsert(&record, &tag_names).await?;
        let tags = match self.store.get(problem.problem_id).await? {
            Some(bundle) => bundle.tags,
            None => Vec::new(),
        };
        Ok(ProblemBundle { problem, tags })
    }
}

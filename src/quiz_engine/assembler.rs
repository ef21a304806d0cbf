use futures::future::join_all;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::quiz_engine::{
    allocation::{allocate_by_weight, allocate_explicit, allocate_total},
    error::{QuizError, Result},
    models::{Allocation, AllocationStrategy, DomainKey, Pool, PoolSize, QuizRequest, TaggedQuestion},
    sampler::{sample, shuffle},
    source::PoolSource,
};

/// Builds a quiz from a [`PoolSource`].
pub struct QuizAssembler<S> {
    source: S,
    strategy: AllocationStrategy,
}

impl<S: PoolSource> QuizAssembler<S> {
    pub fn new(source: S) -> Self {
        QuizAssembler { source, strategy: AllocationStrategy::default() }
    }

    /// Policy used for [`QuizRequest::Total`].
    pub fn with_strategy(mut self, strategy: AllocationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load pools, allocate, sample, tag and shuffle.
    ///
    /// Pools that fail to load count as empty. An empty result is reported as
    /// [`QuizError::NoCapacity`].
    pub async fn assemble<R: Rng + ?Sized>(
        &self,
        request: &QuizRequest,
        rng: &mut R,
    ) -> Result<Vec<TaggedQuestion>> {
        let requested = match request {
            QuizRequest::PerPoolCounts(counts) => counts.iter().fold(0usize, |acc, (_, n)| acc.saturating_add(*n)),
            QuizRequest::Total { total_count, .. } => *total_count,
            QuizRequest::Weighted { total, .. } => *total,
        };
        if requested == 0 {
            return Err(QuizError::InvalidRequest("request at least one question".into()));
        }

        let domains = self.resolve_domains(request).await;
        let pools = self.load_pools(&domains).await;
        let sizes: Vec<PoolSize> = pools.iter().map(Pool::capacity).collect();

        let allocation = match request {
            QuizRequest::PerPoolCounts(counts) => allocate_explicit(counts, &sizes),
            QuizRequest::Total { total_count, .. } => allocate_total(self.strategy, *total_count, &sizes),
            QuizRequest::Weighted { total, weights } => {
                allocate_explicit(&allocation_pairs(&allocate_by_weight(*total, weights)), &sizes)
            }
        };
        debug!(%allocation, "allocation computed");

        let mut quiz = draw(&pools, &allocation, rng);
        if quiz.is_empty() {
            warn!(requested, "no quiz could be generated");
            return Err(QuizError::NoCapacity);
        }
        shuffle(&mut quiz, rng);
        info!(requested, drawn = quiz.len(), pools = pools.len(), "quiz assembled");
        Ok(quiz)
    }

    async fn resolve_domains(&self, request: &QuizRequest) -> Vec<DomainKey> {
        let mut domains: Vec<DomainKey> = match request {
            QuizRequest::PerPoolCounts(counts) => counts.iter().map(|(k, _)| k.clone()).collect(),
            QuizRequest::Weighted { weights, .. } => weights.iter().map(|(k, _)| k.clone()).collect(),
            QuizRequest::Total { selected_domains, .. } => {
                let known = self.known_domains().await;
                let chosen: Vec<DomainKey> = selected_domains
                    .iter()
                    .filter(|d| known.contains(d))
                    .cloned()
                    .collect();
                if chosen.is_empty() {
                    if !selected_domains.is_empty() {
                        warn!(?selected_domains, "none of the selected domains are known; using all domains");
                    }
                    known
                } else {
                    chosen
                }
            }
        };
        let mut seen = Vec::with_capacity(domains.len());
        domains.retain(|d| {
            let fresh = !seen.contains(d);
            if fresh {
                seen.push(d.clone());
            }
            fresh
        });
        domains
    }

    async fn known_domains(&self) -> Vec<DomainKey> {
        self.source.domains().await.unwrap_or_else(|err| {
            warn!(error = %err, "could not list domains");
            Vec::new()
        })
    }

    /// Every load finishes before any allocation starts.
    async fn load_pools(&self, domains: &[DomainKey]) -> Vec<Pool> {
        let loads = domains.iter().map(|d| self.source.fetch(d));
        join_all(loads)
            .await
            .into_iter()
            .zip(domains)
            .map(|(loaded, key)| match loaded {
                Ok(questions) => Pool::new(key.clone(), questions),
                Err(err) => {
                    warn!(domain = %key, error = %err, "pool unavailable, treating as empty");
                    Pool::empty(key.clone())
                }
            })
            .collect()
    }
}

fn allocation_pairs(allocation: &Allocation) -> Vec<(DomainKey, usize)> {
    allocation.iter().map(|(k, n)| (k.to_string(), n)).collect()
}

fn draw<R: Rng + ?Sized>(pools: &[Pool], allocation: &Allocation, rng: &mut R) -> Vec<TaggedQuestion> {
    let mut quiz = Vec::with_capacity(allocation.total());
    for (domain, count) in allocation.iter() {
        if count == 0 {
            continue;
        }
        let Some(pool) = pools.iter().find(|p| p.key == domain) else {
            continue;
        };
        quiz.extend(
            sample(&pool.questions, count, rng)
                .into_iter()
                .map(|q| TaggedQuestion::new(q, domain)),
        );
    }
    quiz
}

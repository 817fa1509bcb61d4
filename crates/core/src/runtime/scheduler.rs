use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::cadence::Cadence;
use super::shutdown::ShutdownGuard;
use crate::config::BotCfg;
use crate::pipeline::{self, Pipeline};
use crate::state::{BotState, StateError, StateStore};
use crate::types::{
    Correction, CycleReport, Phase, PhaseReport, Post, ReplyAction, SkipReason, TargetWord,
};
use pedant_platform::client::{MentionsQuery, Platform, Reply, SearchQuery};

/// Core runtime that drives the bot's fixed-cadence cycle.
pub struct Runtime {
    cfg: Arc<BotCfg>,
    shutdown: ShutdownGuard,
    platform: Arc<dyn Platform>,
    store: Arc<dyn StateStore>,
    pipeline: Pipeline,
    /// History + cursor. Only this runtime touches it.
    state: BotState,
    cadence: Cadence,
    cycle_count: u64,
}

impl Runtime {
    /// Restore persisted state and build the runtime. A load failure is fatal:
    /// the bot never starts from partially-initialized state.
    pub async fn boot(
        cfg: Arc<BotCfg>,
        platform: Arc<dyn Platform>,
        store: Arc<dyn StateStore>,
        pipeline: Pipeline,
    ) -> Result<Self, StateError> {
        let state = store.load().await?;
        tracing::info!(
            authors = state.history.len(),
            last_mention_id = state.cursor.last_mention_id,
            last_cycle_at = ?state.cursor.last_cycle_at,
            "state restored"
        );
        Ok(Self {
            cadence: Cadence::from_cfg(&cfg),
            cfg,
            shutdown: ShutdownGuard::new(),
            platform,
            store,
            pipeline,
            state,
            cycle_count: 0,
        })
    }

    /// Returns the cancellation token that stops the run loop.
    pub fn token(&self) -> CancellationToken {
        self.shutdown.token()
    }

    pub fn state(&self) -> &BotState {
        &self.state
    }

    /// Start the signal listener and loop until shutdown. Each wait is computed
    /// from the previous cycle's timestamp; a cycle in progress always completes.
    pub async fn run(&mut self) {
        self.shutdown.spawn_signal_listener();
        let token = self.shutdown.token();

        tracing::info!(platform = self.platform.name(), "pedant runtime started");

        loop {
            let delay = self
                .cadence
                .next_delay(self.state.cursor.last_cycle_at, Utc::now());
            tracing::info!(delay_ms = delay.as_millis() as u64, "next cycle scheduled");

            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(
                        cycles = self.cycle_count,
                        "shutdown signal received, exiting cycle loop"
                    );
                    break;
                },
                _ = tokio::time::sleep(delay) => {
                    self.run_cycle(Utc::now()).await;
                },
            }
        }

        tracing::info!("pedant runtime stopped");
    }

    /// One full cycle: search phase, mention phase, timestamp, persist.
    /// `now` is the cycle's start and becomes the next cadence anchor.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        self.cycle_count += 1;
        let span = tracing::info_span!("cycle", n = self.cycle_count);
        self.cycle(now).instrument(span).await
    }

    async fn cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let search = self.search_phase().await;
        let mentions = self.mention_phase().await;

        self.state.cursor.mark_cycle(now);
        let persisted = self.persist().await;

        let report = CycleReport {
            search,
            mentions,
            persisted,
        };
        tracing::info!(
            searched = search.fetched,
            mentions = mentions.fetched,
            skipped = search.skipped + mentions.skipped,
            replies = report.replies_sent(),
            reply_failures = search.reply_failures + mentions.reply_failures,
            persisted,
            "cycle complete"
        );
        report
    }

    /// Search path: no per-author dedup.
    async fn search_phase(&mut self) -> PhaseReport {
        let query = SearchQuery {
            query: TargetWord::search_query(),
            lang: self.cfg.search_lang.clone(),
            count: self.cfg.search_count,
        };
        let mut report = PhaseReport::default();
        let posts = match self.platform.search(query).await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!(error = %e, "search fetch failed, treating as empty");
                report.fetch_failed = true;
                return report;
            }
        };
        report.fetched = posts.len();

        for post in &posts {
            match self.pipeline.decide(post) {
                Ok(correction) => self.send(Phase::Search, post, correction, &mut report).await,
                Err(reason) => skip(Phase::Search, post, &reason, &mut report),
            }
        }
        report
    }

    /// Mention path: retweets dropped first, cursor advanced for every mention,
    /// one reply per author ever.
    async fn mention_phase(&mut self) -> PhaseReport {
        let query = MentionsQuery {
            count: self.cfg.mention_count,
            since_id: self.state.cursor.since_id(),
        };
        let mut report = PhaseReport::default();
        let posts = match self.platform.mentions(query).await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    since_id = ?query.since_id,
                    "mentions fetch failed, treating as empty"
                );
                report.fetch_failed = true;
                return report;
            }
        };
        report.fetched = posts.len();

        for post in &posts {
            self.state.cursor.advance_to(post.id);

            if pipeline::is_retweet(post) {
                skip(Phase::Mentions, post, &SkipReason::Retweet, &mut report);
                continue;
            }
            let correction = match self.pipeline.decide(post) {
                Ok(c) => c,
                Err(reason) => {
                    skip(Phase::Mentions, post, &reason, &mut report);
                    continue;
                }
            };
            if !self.state.history.admit(&post.author.handle) {
                skip(Phase::Mentions, post, &SkipReason::AlreadyContacted, &mut report);
                continue;
            }
            self.send(Phase::Mentions, post, correction, &mut report).await;
        }
        report
    }

    /// Publish one reply. Failures are logged and not retried; state already
    /// updated for this post stays as is.
    async fn send(
        &self,
        phase: Phase,
        post: &Post,
        correction: Correction,
        report: &mut PhaseReport,
    ) {
        let action = ReplyAction {
            in_reply_to: post.id,
            handle: post.author.handle.clone(),
            correction,
        };
        tracing::info!(
            %phase,
            post_id = post.id,
            handle = %action.handle,
            text = %post.text,
            %correction,
            "correcting"
        );
        let reply = Reply {
            status: action.status(),
            in_reply_to: action.in_reply_to,
        };
        match self.platform.reply(reply).await {
            Ok(posted) => {
                report.replied += 1;
                tracing::info!(handle = %action.handle, reply_id = posted.id, "correction sent");
            }
            Err(e) => {
                report.reply_failures += 1;
                tracing::warn!(
                    handle = %action.handle,
                    post_id = post.id,
                    error = %e,
                    "failed to send correction"
                );
            }
        }
    }

    /// Flush history + cursor. On failure the in-memory state stays authoritative
    /// and the next cycle's write catches up.
    async fn persist(&self) -> bool {
        match self.store.save(&self.state).await {
            Ok(()) => {
                tracing::debug!("state persisted");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to persist state");
                false
            }
        }
    }
}

fn skip(phase: Phase, post: &Post, reason: &SkipReason, report: &mut PhaseReport) {
    report.skipped += 1;
    tracing::info!(
        %phase,
        post_id = post.id,
        handle = %post.author.handle,
        %reason,
        "post skipped"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::filter::Blacklist;
    use crate::pipeline::selector::{CorrectionSelector, ScriptedDice};
    use crate::state::MemoryStore;
    use pedant_platform::client::MockPlatform;

    async fn runtime(platform: Arc<MockPlatform>, store: Arc<MemoryStore>) -> Runtime {
        let selector = CorrectionSelector::new(0.8, Box::new(ScriptedDice::default()));
        let pipeline = Pipeline::new(selector, Blacklist::new(["spoiler"]));
        Runtime::boot(Arc::new(BotCfg::default()), platform, store, pipeline)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn boot_fails_without_state() {
        let selector = CorrectionSelector::new(0.8, Box::new(ScriptedDice::default()));
        let result = Runtime::boot(
            Arc::new(BotCfg::default()),
            Arc::new(MockPlatform::new()),
            Arc::new(MemoryStore::empty()),
            Pipeline::new(selector, Blacklist::default()),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cycle_marks_timestamp_and_persists() {
        let platform = Arc::new(MockPlatform::new());
        let store = Arc::new(MemoryStore::new());
        let mut rt = runtime(platform, store.clone()).await;
        let now = Utc::now();
        let report = rt.run_cycle(now).await;
        assert!(report.persisted);
        assert_eq!(rt.state().cursor.last_cycle_at, Some(now));
        assert_eq!(store.snapshot().unwrap().cursor.last_cycle_at, Some(now));
    }

    #[tokio::test]
    async fn search_uses_configured_query() {
        let platform = Arc::new(MockPlatform::new());
        let mut rt = runtime(platform.clone(), Arc::new(MemoryStore::new())).await;
        rt.run_cycle(Utc::now()).await;
        let searches = platform.searches();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].query, "your youre you're");
        assert_eq!(searches[0].lang, "en");
        assert_eq!(searches[0].count, 5);
        assert_eq!(platform.mention_queries()[0].count, 10);
    }

    #[tokio::test]
    async fn run_loop_stops_on_cancel() {
        let platform = Arc::new(MockPlatform::new());
        let mut rt = runtime(platform, Arc::new(MemoryStore::new())).await;
        rt.token().cancel();
        tokio::time::timeout(std::time::Duration::from_secs(5), rt.run())
            .await
            .unwrap();
    }
}

//! Reconciliation: make the channels mirror the tracker's open items.
//!
//! One pass resolves both destination channels, loads the tracking state
//! once, reconciles issues then pull requests, and saves the state once.
//! Per item type:
//!
//! 1. fetch the live set `L`,
//! 2. delete the message of every tracked number not in `L` and forget it,
//!    whether or not the delete succeeded,
//! 3. post a summary for every live item not yet tracked and remember it
//!    only if the post succeeded, so failures are retried next pass.

use std::collections::{BTreeMap, HashSet};

use tracing::{error, info, warn};

use crate::config::{Destinations, FetchFailurePolicy};
use crate::context::ServiceContext;
use crate::error::MirrorError;
use crate::model::{ChannelRef, DeleteOutcome, ItemType, MessageId, RemoteItem};
use crate::present::present;
use crate::store::{StateStore, TrackingStore};

/// The actions needed to bring one item type in line with the tracker.
#[derive(Debug, PartialEq)]
pub struct ReconcilePlan<'a> {
    /// Tracked numbers no longer open, ascending.
    pub removals: Vec<u64>,
    /// Open items not yet tracked, in tracker order.
    pub additions: Vec<&'a RemoteItem>,
}

impl ReconcilePlan<'_> {
    /// `true` when nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.additions.is_empty()
    }
}

/// Diffs the tracked map against the live items.
///
/// Removals are `T − L`, additions are `L − T`. A number listed twice by the
/// tracker (pages shifting mid-fetch) is added once.
#[must_use]
pub fn plan<'a>(tracked: &BTreeMap<u64, MessageId>, live: &'a [RemoteItem]) -> ReconcilePlan<'a> {
    let live_numbers: HashSet<u64> = live.iter().map(|item| item.number).collect();

    let removals = tracked.keys().copied().filter(|n| !live_numbers.contains(n)).collect();

    let mut seen = HashSet::new();
    let additions = live
        .iter()
        .filter(|item| !tracked.contains_key(&item.number) && seen.insert(item.number))
        .collect();

    ReconcilePlan { removals, additions }
}

/// What happened to one item type during a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeOutcome {
    /// Numbers posted and now tracked.
    pub posted: Vec<u64>,
    /// Numbers whose post failed; still untracked.
    pub failed_posts: Vec<u64>,
    /// Numbers removed from tracking.
    pub removed: Vec<u64>,
    /// Removed numbers whose message could not be deleted.
    pub failed_deletes: Vec<u64>,
    /// Fetch error, when the live set could not be read.
    pub fetch_error: Option<String>,
    /// `true` when the item type was left untouched because of a fetch error.
    pub skipped: bool,
}

/// Outcome of a full pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Issue outcome.
    pub issues: TypeOutcome,
    /// Pull request outcome.
    pub pulls: TypeOutcome,
}

impl PassReport {
    /// Outcome for one item type.
    #[must_use]
    pub fn outcome(&self, item_type: ItemType) -> &TypeOutcome {
        match item_type {
            ItemType::Issue => &self.issues,
            ItemType::PullRequest => &self.pulls,
        }
    }

    fn outcome_mut(&mut self, item_type: ItemType) -> &mut TypeOutcome {
        match item_type {
            ItemType::Issue => &mut self.issues,
            ItemType::PullRequest => &mut self.pulls,
        }
    }
}

/// Drives one reconciliation pass against the context's ports.
pub struct Reconciler<'a> {
    ctx: &'a ServiceContext,
    store: StateStore<'a>,
    destinations: &'a Destinations,
    policy: FetchFailurePolicy,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler writing state through `store`.
    #[must_use]
    pub fn new(
        ctx: &'a ServiceContext,
        store: StateStore<'a>,
        destinations: &'a Destinations,
        policy: FetchFailurePolicy,
    ) -> Self {
        Self { ctx, store, destinations, policy }
    }

    /// Runs a full pass over both item types.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the state file untouched, when a destination
    /// channel cannot be resolved or the state cannot be loaded or saved.
    /// Fetch, post, and delete failures are reported in the [`PassReport`].
    pub async fn reconcile_all(&self) -> Result<PassReport, MirrorError> {
        let mut channels = Vec::with_capacity(ItemType::ALL.len());
        for item_type in ItemType::ALL {
            channels.push((item_type, self.resolve_channel(item_type).await?));
        }

        let mut tracking = self.store.load()?;
        let mut report = PassReport::default();
        for (item_type, channel) in &channels {
            *report.outcome_mut(*item_type) =
                self.reconcile_one(*item_type, channel, &mut tracking).await;
        }
        self.store.save(&tracking)?;

        Ok(report)
    }

    /// Reconciles one item type against `tracking` in place.
    pub async fn reconcile_one(
        &self,
        item_type: ItemType,
        channel: &ChannelRef,
        tracking: &mut TrackingStore,
    ) -> TypeOutcome {
        let mut outcome = TypeOutcome::default();

        let live = match self.ctx.tracker.fetch_open(item_type).await {
            Ok(items) => items,
            Err(e) => {
                let err = MirrorError::Fetch { item_type, message: e.to_string() };
                outcome.fetch_error = Some(err.to_string());
                match self.policy {
                    FetchFailurePolicy::Skip => {
                        error!(%item_type, error = %err, "skipping item type until next pass");
                        outcome.skipped = true;
                        return outcome;
                    }
                    FetchFailurePolicy::TreatAsEmpty => {
                        error!(%item_type, error = %err, "treating failed fetch as no open items");
                        Vec::new()
                    }
                }
            }
        };

        let tracked = tracking.tracked_mut(item_type);
        let ReconcilePlan { removals, additions } = plan(tracked, &live);

        for number in removals {
            let Some(message_id) = tracked.remove(&number) else { continue };
            match self.ctx.channels.delete(channel, &message_id).await {
                Ok(DeleteOutcome::Deleted) => {
                    info!("Removed closed {} #{number}", item_type.noun());
                }
                Ok(DeleteOutcome::NotFound) => {
                    info!(
                        "Forgot closed {} #{number}; message {message_id} was already gone",
                        item_type.noun()
                    );
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "Could not delete message {message_id} for {} #{number}",
                        item_type.noun()
                    );
                    outcome.failed_deletes.push(number);
                }
            }
            outcome.removed.push(number);
        }

        for item in additions {
            let summary = present(item, item_type);
            match self.ctx.channels.post(channel, &summary).await {
                Ok(message_id) => {
                    tracked.insert(item.number, message_id);
                    info!("Added new {} #{}", item_type.noun(), item.number);
                    outcome.posted.push(item.number);
                }
                Err(e) => {
                    warn!(error = %e, "Error posting {} #{}", item_type.noun(), item.number);
                    outcome.failed_posts.push(item.number);
                }
            }
        }

        outcome
    }

    async fn resolve_channel(&self, item_type: ItemType) -> Result<ChannelRef, MirrorError> {
        let channel_id = self.destinations.channel_for(item_type);
        match self.ctx.channels.lookup_channel(channel_id).await {
            Ok(Some(channel)) => Ok(channel),
            Ok(None) => Err(MirrorError::ChannelMissing { channel_id: channel_id.to_string() }),
            Err(e) => Err(MirrorError::ChannelLookup {
                channel_id: channel_id.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::test_support::{context_with, remote_item, FakeChannel, FakeTracker, MemFs};

    const STATE: &str = "/state/github_tracking.json";

    fn destinations() -> Destinations {
        Destinations { issues: "1001".into(), prs: "1002".into() }
    }

    fn tracked(pairs: &[(u64, &str)]) -> BTreeMap<u64, MessageId> {
        pairs.iter().map(|(n, id)| (*n, MessageId::new(*id))).collect()
    }

    fn issues_channel() -> ChannelRef {
        ChannelRef { id: "1001".into(), name: None }
    }

    struct Harness {
        fs: MemFs,
        tracker: FakeTracker,
        channel: FakeChannel,
        ctx: ServiceContext,
        destinations: Destinations,
    }

    impl Harness {
        fn new() -> Self {
            let fs = MemFs::new();
            let tracker = FakeTracker::default();
            let channel = FakeChannel::with_channels(&["1001", "1002"]);
            let ctx = context_with(&fs, &tracker, &channel);
            Self { fs, tracker, channel, ctx, destinations: destinations() }
        }

        fn reconciler(&self, policy: FetchFailurePolicy) -> Reconciler<'_> {
            Reconciler::new(
                &self.ctx,
                StateStore::new(&self.ctx, Path::new(STATE)),
                &self.destinations,
                policy,
            )
        }

        fn saved(&self) -> TrackingStore {
            serde_json::from_str(&self.fs.get(STATE).expect("state was saved")).unwrap()
        }
    }

    // --- plan ---

    #[test]
    fn plan_diffs_tracked_against_live() {
        let live = vec![remote_item(2), remote_item(3)];
        let result = plan(&tracked(&[(1, "m1"), (2, "m2")]), &live);
        assert_eq!(result.removals, vec![1]);
        assert_eq!(result.additions.iter().map(|i| i.number).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn plan_is_empty_when_in_sync() {
        let live = vec![remote_item(4), remote_item(5)];
        assert!(plan(&tracked(&[(4, "a"), (5, "b")]), &live).is_empty());
    }

    #[test]
    fn plan_keeps_tracker_order_and_drops_duplicates() {
        let live = vec![remote_item(9), remote_item(2), remote_item(9), remote_item(5)];
        let result = plan(&BTreeMap::new(), &live);
        assert_eq!(result.additions.iter().map(|i| i.number).collect::<Vec<_>>(), vec![9, 2, 5]);
    }

    #[test]
    fn plan_laws_hold_over_many_sets() {
        for mask_t in 0u32..32 {
            for mask_l in 0u32..32 {
                let t: BTreeMap<u64, MessageId> = (0u32..5)
                    .filter(|b| mask_t & (1 << b) != 0)
                    .map(|b| (u64::from(b), MessageId::new(format!("m{b}"))))
                    .collect();
                let live: Vec<RemoteItem> = (0u32..5)
                    .filter(|b| mask_l & (1 << b) != 0)
                    .map(|b| remote_item(u64::from(b)))
                    .collect();

                let result = plan(&t, &live);
                let l: HashSet<u64> = live.iter().map(|i| i.number).collect();
                let expected_removals: Vec<u64> =
                    t.keys().copied().filter(|n| !l.contains(n)).collect();
                let mut expected_additions: Vec<u64> =
                    l.iter().copied().filter(|n| !t.contains_key(n)).collect();
                expected_additions.sort_unstable();
                let mut additions: Vec<u64> = result.additions.iter().map(|i| i.number).collect();
                additions.sort_unstable();

                assert_eq!(result.removals, expected_removals);
                assert_eq!(additions, expected_additions);
            }
        }
    }

    // --- reconcile_one ---

    #[tokio::test]
    async fn replaces_closed_item_with_new_one() {
        let h = Harness::new();
        h.channel.seed_message("1001", "m1");
        h.channel.seed_message("1001", "m2");
        h.tracker.set_numbers(ItemType::Issue, &[2, 3]);

        let mut tracking =
            TrackingStore { issues: tracked(&[(1, "m1"), (2, "m2")]), ..Default::default() };
        let outcome = h
            .reconciler(FetchFailurePolicy::Skip)
            .reconcile_one(ItemType::Issue, &issues_channel(), &mut tracking)
            .await;

        assert_eq!(outcome.removed, vec![1]);
        assert_eq!(outcome.posted, vec![3]);
        assert_eq!(h.channel.deleted(), vec![MessageId::new("m1")]);
        assert_eq!(h.channel.posted_titles(), vec!["#3: Item 3"]);
        assert_eq!(tracking.issues, tracked(&[(2, "m2"), (3, "m-new-1")]));
    }

    #[tokio::test]
    async fn empty_store_posts_every_open_item() {
        let h = Harness::new();
        h.tracker.set_numbers(ItemType::Issue, &[5]);

        let mut tracking = TrackingStore::default();
        h.reconciler(FetchFailurePolicy::Skip)
            .reconcile_one(ItemType::Issue, &issues_channel(), &mut tracking)
            .await;

        assert_eq!(h.channel.posted_titles().len(), 1);
        assert_eq!(tracking.issues, tracked(&[(5, "m-new-1")]));
    }

    #[tokio::test]
    async fn second_run_without_changes_is_a_no_op() {
        let h = Harness::new();
        h.tracker.set_numbers(ItemType::Issue, &[1, 2, 3]);
        let reconciler = h.reconciler(FetchFailurePolicy::Skip);

        let mut tracking = TrackingStore::default();
        reconciler.reconcile_one(ItemType::Issue, &issues_channel(), &mut tracking).await;
        let after_first = tracking.clone();
        let second =
            reconciler.reconcile_one(ItemType::Issue, &issues_channel(), &mut tracking).await;

        assert_eq!(second, TypeOutcome::default());
        assert_eq!(tracking, after_first);
        assert_eq!(h.channel.posted_titles().len(), 3);
        assert!(h.channel.delete_attempts().is_empty());
    }

    #[tokio::test]
    async fn missing_message_is_forgotten_like_a_deleted_one() {
        let h = Harness::new();
        h.tracker.set_numbers(ItemType::Issue, &[]);

        let mut tracking = TrackingStore { issues: tracked(&[(8, "gone")]), ..Default::default() };
        let outcome = h
            .reconciler(FetchFailurePolicy::Skip)
            .reconcile_one(ItemType::Issue, &issues_channel(), &mut tracking)
            .await;

        assert_eq!(outcome.removed, vec![8]);
        assert!(outcome.failed_deletes.is_empty());
        assert!(tracking.issues.is_empty());
    }

    #[tokio::test]
    async fn failed_delete_still_forgets_the_item() {
        let h = Harness::new();
        h.channel.seed_message("1001", "m1");
        h.channel.fail_deletes();
        h.tracker.set_numbers(ItemType::Issue, &[]);

        let mut tracking = TrackingStore { issues: tracked(&[(1, "m1")]), ..Default::default() };
        let outcome = h
            .reconciler(FetchFailurePolicy::Skip)
            .reconcile_one(ItemType::Issue, &issues_channel(), &mut tracking)
            .await;

        assert_eq!(outcome.removed, vec![1]);
        assert_eq!(outcome.failed_deletes, vec![1]);
        assert_eq!(h.channel.delete_attempts(), vec![MessageId::new("m1")]);
        assert!(tracking.issues.is_empty());
    }

    #[tokio::test]
    async fn failed_post_stays_untracked_and_is_retried() {
        let h = Harness::new();
        h.tracker.set_numbers(ItemType::Issue, &[1, 2]);
        h.channel.fail_post_for(2);
        let reconciler = h.reconciler(FetchFailurePolicy::Skip);

        let mut tracking = TrackingStore::default();
        let first =
            reconciler.reconcile_one(ItemType::Issue, &issues_channel(), &mut tracking).await;
        assert_eq!(first.posted, vec![1]);
        assert_eq!(first.failed_posts, vec![2]);
        assert!(!tracking.issues.contains_key(&2));

        let second =
            reconciler.reconcile_one(ItemType::Issue, &issues_channel(), &mut tracking).await;
        assert_eq!(second.failed_posts, vec![2]);
        assert_eq!(h.channel.posted_titles(), vec!["#1: Item 1"]);
    }

    #[tokio::test]
    async fn fetch_failure_skips_item_type_by_default() {
        let h = Harness::new();
        h.channel.seed_message("1001", "m1");
        h.tracker.fail(ItemType::Issue, "GitHub request failed: connection reset");

        let mut tracking = TrackingStore { issues: tracked(&[(1, "m1")]), ..Default::default() };
        let outcome = h
            .reconciler(FetchFailurePolicy::Skip)
            .reconcile_one(ItemType::Issue, &issues_channel(), &mut tracking)
            .await;

        assert!(outcome.skipped);
        assert!(outcome.fetch_error.as_deref().unwrap().contains("connection reset"));
        assert!(outcome.removed.is_empty());
        assert_eq!(tracking.issues, tracked(&[(1, "m1")]));
        assert!(h.channel.delete_attempts().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_as_empty_removes_everything_tracked() {
        let h = Harness::new();
        h.channel.seed_message("1001", "m1");
        h.channel.seed_message("1001", "m2");
        h.tracker.fail(ItemType::Issue, "GitHub API error (502): Bad Gateway");

        let mut tracking =
            TrackingStore { issues: tracked(&[(1, "m1"), (2, "m2")]), ..Default::default() };
        let outcome = h
            .reconciler(FetchFailurePolicy::TreatAsEmpty)
            .reconcile_one(ItemType::Issue, &issues_channel(), &mut tracking)
            .await;

        assert!(!outcome.skipped);
        assert!(outcome.fetch_error.is_some());
        assert_eq!(outcome.removed, vec![1, 2]);
        assert_eq!(h.channel.deleted(), vec![MessageId::new("m1"), MessageId::new("m2")]);
        assert!(tracking.issues.is_empty());
    }

    // --- reconcile_all ---

    #[tokio::test]
    async fn full_pass_routes_types_to_their_channels_and_saves_once() {
        let h = Harness::new();
        h.tracker.set_numbers(ItemType::Issue, &[1]);
        h.tracker.set_numbers(ItemType::PullRequest, &[2]);

        let report = h.reconciler(FetchFailurePolicy::Skip).reconcile_all().await.unwrap();

        assert_eq!(report.issues.posted, vec![1]);
        assert_eq!(report.pulls.posted, vec![2]);
        let channels: Vec<String> = h.channel.posts().into_iter().map(|(c, _)| c).collect();
        assert_eq!(channels, vec!["1001", "1002"]);

        let saved = h.saved();
        assert_eq!(saved.issues.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(saved.prs.keys().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[tokio::test]
    async fn one_failing_type_does_not_stop_the_other() {
        let h = Harness::new();
        h.tracker.fail(ItemType::Issue, "timeout");
        h.tracker.set_numbers(ItemType::PullRequest, &[7]);

        let report = h.reconciler(FetchFailurePolicy::Skip).reconcile_all().await.unwrap();

        assert!(report.issues.skipped);
        assert_eq!(report.pulls.posted, vec![7]);
        assert_eq!(h.saved().prs.len(), 1);
    }

    #[tokio::test]
    async fn missing_channel_aborts_without_saving() {
        let fs = MemFs::new();
        let tracker = FakeTracker::default();
        let channel = FakeChannel::with_channels(&["1001"]);
        tracker.set_numbers(ItemType::Issue, &[1]);
        let ctx = context_with(&fs, &tracker, &channel);
        let destinations = destinations();
        let reconciler = Reconciler::new(
            &ctx,
            StateStore::new(&ctx, Path::new(STATE)),
            &destinations,
            FetchFailurePolicy::Skip,
        );

        let err = reconciler.reconcile_all().await.unwrap_err();

        assert!(
            matches!(err, MirrorError::ChannelMissing { ref channel_id } if channel_id == "1002")
        );
        assert!(fs.get(STATE).is_none());
        assert_eq!(tracker.calls(), 0);
        assert!(channel.posted_titles().is_empty());
    }

    #[tokio::test]
    async fn channel_lookup_error_aborts_without_saving() {
        let h = Harness::new();
        h.fs.insert(STATE, r#"{"issues":{"1":"m1"},"prs":{}}"#);
        h.channel.fail_lookup("Discord channel lookup request failed: dns error");

        let err = h.reconciler(FetchFailurePolicy::Skip).reconcile_all().await.unwrap_err();

        assert!(matches!(err, MirrorError::ChannelLookup { .. }));
        assert_eq!(h.fs.get(STATE).as_deref(), Some(r#"{"issues":{"1":"m1"},"prs":{}}"#));
    }

    #[tokio::test]
    async fn pass_picks_up_previous_state() {
        let h = Harness::new();
        h.fs.insert(STATE, r#"{"issues":{"1":"m1","2":"m2"},"prs":{}}"#);
        h.channel.seed_message("1001", "m1");
        h.channel.seed_message("1001", "m2");
        h.tracker.set_numbers(ItemType::Issue, &[2, 3]);

        let report = h.reconciler(FetchFailurePolicy::Skip).reconcile_all().await.unwrap();

        assert_eq!(report.issues.removed, vec![1]);
        assert_eq!(report.issues.posted, vec![3]);
        assert_eq!(h.saved().issues, tracked(&[(2, "m2"), (3, "m-new-1")]));
    }
}

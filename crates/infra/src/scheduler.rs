//! Time-gated sweeps driving automatic status transitions.
//!
//! A background ticker periodically scans for products whose sale or event
//! schedule has crossed a time gate and moves them through the regular
//! transition table. Each candidate is its own unit of work: the gate and
//! source status are re-checked under the product's lock before committing,
//! so a product selected by two overlapping sweeps in one tick transitions
//! exactly once. A failed candidate is logged and left for the next tick;
//! the requery by time predicate is the retry mechanism.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use boxoffice_product::{Product, ProductStatus};

use crate::repository::{ProductFilter, ProductRepository};

/// Which schedule boundary a sweep keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeGate {
    SaleOpens,
    SaleCloses,
    EventEnds,
}

/// One scan rule: products in `source` whose `gate` has passed move to
/// `target`.
#[derive(Debug, Clone, Copy)]
pub struct Sweep {
    name: &'static str,
    source: ProductStatus,
    gate: TimeGate,
    target: ProductStatus,
}

impl Sweep {
    pub const fn new(
        name: &'static str,
        source: ProductStatus,
        gate: TimeGate,
        target: ProductStatus,
    ) -> Self {
        Self {
            name,
            source,
            gate,
            target,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn filter(&self, now: DateTime<Utc>) -> ProductFilter {
        let mut filter = ProductFilter::by_status(self.source);
        match self.gate {
            TimeGate::SaleOpens => filter.sale_opens_before = Some(now),
            TimeGate::SaleCloses => filter.sale_closes_before = Some(now),
            TimeGate::EventEnds => filter.event_ends_before = Some(now),
        }
        filter
    }

    fn gate_passed(&self, product: &Product, now: DateTime<Utc>) -> bool {
        match self.gate {
            TimeGate::SaleOpens => product.sale_schedule().has_opened(now),
            TimeGate::SaleCloses => product.sale_schedule().has_closed(now),
            TimeGate::EventEnds => product.event_schedule().has_ended(now),
        }
    }
}

/// The standard sweep set.
///
/// Sale close and event end both park the product in SoldOut, from which an
/// operator can reopen the sale; the event-end sweep is the backstop for
/// products whose sale close was never processed.
pub fn default_sweeps() -> Vec<Sweep> {
    vec![
        Sweep::new(
            "sale-open",
            ProductStatus::Pending,
            TimeGate::SaleOpens,
            ProductStatus::OnSale,
        ),
        Sweep::new(
            "sale-close",
            ProductStatus::OnSale,
            TimeGate::SaleCloses,
            ProductStatus::SoldOut,
        ),
        Sweep::new(
            "event-complete",
            ProductStatus::OnSale,
            TimeGate::EventEnds,
            ProductStatus::SoldOut,
        ),
    ]
}

/// Outcome counts of one sweep over one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub sweep: &'static str,
    pub candidates: usize,
    pub transitioned: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum SweepAction {
    Transitioned,
    Skipped,
}

pub struct SweepRunner<R> {
    repo: R,
    sweeps: Vec<Sweep>,
}

impl<R: ProductRepository> SweepRunner<R> {
    pub fn new(repo: R) -> Self {
        Self::with_sweeps(repo, default_sweeps())
    }

    pub fn with_sweeps(repo: R, sweeps: Vec<Sweep>) -> Self {
        Self { repo, sweeps }
    }

    /// Run every sweep once against the clock value `now`.
    pub fn run_once(&self, now: DateTime<Utc>) -> Vec<SweepReport> {
        self.sweeps
            .iter()
            .map(|sweep| self.run_sweep(sweep, now))
            .collect()
    }

    fn run_sweep(&self, sweep: &Sweep, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport {
            sweep: sweep.name,
            candidates: 0,
            transitioned: 0,
            skipped: 0,
            failed: 0,
        };

        let ids = match self.repo.find_ids(&sweep.filter(now)) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(sweep = sweep.name, error = %e, "sweep query failed");
                report.failed = 1;
                return report;
            }
        };
        report.candidates = ids.len();

        for id in ids {
            let result = self.repo.update(id, |p| {
                // Selection ran without the lock; another actor or an earlier
                // sweep may have moved the product since.
                if p.status() != sweep.source || !sweep.gate_passed(p, now) {
                    return Ok(SweepAction::Skipped);
                }
                p.change_status(sweep.target)?;
                Ok(SweepAction::Transitioned)
            });
            match result {
                Ok(SweepAction::Transitioned) => {
                    info!(
                        sweep = sweep.name,
                        product_id = id.value(),
                        status = ?sweep.target,
                        "product transitioned"
                    );
                    report.transitioned += 1;
                }
                Ok(SweepAction::Skipped) => report.skipped += 1,
                Err(e) => {
                    warn!(
                        sweep = sweep.name,
                        product_id = id.value(),
                        error = %e,
                        "sweep item failed, retrying next tick"
                    );
                    report.failed += 1;
                }
            }
        }
        report
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
        }
    }
}

/// Handle over a running scheduler thread.
pub struct SchedulerHandle {
    stop_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the ticker to stop and wait for the thread to finish.
    pub fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.join.join();
    }
}

/// Spawn the ticker thread; each tick runs every sweep against the current
/// clock.
pub fn spawn<R>(runner: SweepRunner<R>, config: SchedulerConfig) -> SchedulerHandle
where
    R: ProductRepository + 'static,
{
    let (stop_tx, stop_rx) = mpsc::channel();
    let join = std::thread::spawn(move || {
        loop {
            match stop_rx.recv_timeout(config.tick_interval) {
                Err(RecvTimeoutError::Timeout) => {
                    runner.run_once(Utc::now());
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    });
    SchedulerHandle { stop_tx, join }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryProductRepository;
    use boxoffice_core::{ProductId, UserId};
    use boxoffice_product::{NewProduct, ProductType, SaleSchedule, Schedule, SeatGrade};
    use chrono::Duration as ChronoDuration;
    use std::sync::Arc;

    fn product(
        id: ProductId,
        now: DateTime<Utc>,
        opens_in: ChronoDuration,
        closes_in: ChronoDuration,
        event_in: ChronoDuration,
    ) -> Product {
        let spec = NewProduct {
            owner: UserId::new(),
            name: "Autumn Stage".to_string(),
            product_type: ProductType::Play,
            running_time_minutes: 80,
            event_schedule: Schedule::new(now + event_in, now + event_in + ChronoDuration::hours(2))
                .unwrap(),
            sale_schedule: SaleSchedule::new(now + opens_in, now + closes_in).unwrap(),
            venue: None,
            grades: vec![SeatGrade::new("A", 5_000, 10, 0).unwrap()],
            total_seats: None,
            content: None,
            booking_policy: None,
            admission_policy: None,
            refund_policy: None,
            age_restriction: None,
        };
        Product::create(id, spec, now).unwrap()
    }

    fn find_report<'a>(reports: &'a [SweepReport], name: &str) -> &'a SweepReport {
        reports.iter().find(|r| r.sweep == name).unwrap()
    }

    #[test]
    fn sale_open_sweep_moves_pending_products_on_sale() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let now = Utc::now();
        // Sale opened an hour ago.
        repo.insert(product(
            ProductId::new(1),
            now - ChronoDuration::hours(2),
            ChronoDuration::hours(1),
            ChronoDuration::days(10),
            ChronoDuration::days(20),
        ))
        .unwrap();
        repo.update(ProductId::new(1), |p| p.change_status(ProductStatus::Pending))
            .unwrap();

        let runner = SweepRunner::new(Arc::clone(&repo));
        let reports = runner.run_once(now);
        assert_eq!(find_report(&reports, "sale-open").transitioned, 1);

        let stored = repo.find_by_id(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(stored.status(), ProductStatus::OnSale);

        // The product left Pending, so the next tick has no candidates.
        let reports = runner.run_once(now);
        let report = find_report(&reports, "sale-open");
        assert_eq!(report.candidates, 0);
        assert_eq!(report.transitioned, 0);
    }

    #[test]
    fn draft_products_are_not_swept() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let now = Utc::now();
        repo.insert(product(
            ProductId::new(1),
            now - ChronoDuration::hours(2),
            ChronoDuration::hours(1),
            ChronoDuration::days(10),
            ChronoDuration::days(20),
        ))
        .unwrap();

        let runner = SweepRunner::new(Arc::clone(&repo));
        runner.run_once(now);
        let stored = repo.find_by_id(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(stored.status(), ProductStatus::Draft);
    }

    #[test]
    fn overlapping_sweeps_transition_a_product_once_per_tick() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let created = Utc::now() - ChronoDuration::days(30);
        // Both the sale close and the event end are in the past.
        repo.insert(product(
            ProductId::new(1),
            created,
            ChronoDuration::hours(1),
            ChronoDuration::days(5),
            ChronoDuration::days(6),
        ))
        .unwrap();
        repo.update(ProductId::new(1), |p| p.change_status(ProductStatus::Pending))
            .unwrap();
        repo.update(ProductId::new(1), |p| p.change_status(ProductStatus::OnSale))
            .unwrap();

        let runner = SweepRunner::new(Arc::clone(&repo));
        let reports = runner.run_once(Utc::now());

        let close = find_report(&reports, "sale-close");
        let complete = find_report(&reports, "event-complete");
        assert_eq!(close.transitioned, 1);
        // The earlier sweep already moved the product out of OnSale, so the
        // backstop sweep finds nothing to do.
        assert_eq!(complete.candidates, 0);
        assert_eq!(complete.transitioned, 0);

        let stored = repo.find_by_id(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(stored.status(), ProductStatus::SoldOut);
    }

    /// Delegates everything but returns a canned candidate list, standing in
    /// for a selection that went stale between the query and the lock.
    struct StaleQueryRepo {
        inner: Arc<InMemoryProductRepository>,
        canned_ids: Vec<ProductId>,
    }

    impl ProductRepository for StaleQueryRepo {
        fn allocate_id(&self) -> ProductId {
            self.inner.allocate_id()
        }

        fn insert(&self, product: Product) -> Result<(), crate::repository::RepositoryError> {
            self.inner.insert(product)
        }

        fn find_by_id(
            &self,
            id: ProductId,
        ) -> Result<Option<Product>, crate::repository::RepositoryError> {
            self.inner.find_by_id(id)
        }

        fn find_ids(
            &self,
            _filter: &ProductFilter,
        ) -> Result<Vec<ProductId>, crate::repository::RepositoryError> {
            Ok(self.canned_ids.clone())
        }

        fn find_page(
            &self,
            filter: &ProductFilter,
            page: crate::repository::PageRequest,
        ) -> Result<crate::repository::Page<Product>, crate::repository::RepositoryError> {
            self.inner.find_page(filter, page)
        }

        fn update<T>(
            &self,
            id: ProductId,
            f: impl FnOnce(&mut Product) -> Result<T, boxoffice_product::ProductError>,
        ) -> Result<T, crate::repository::RepositoryError> {
            self.inner.update(id, f)
        }
    }

    #[test]
    fn stale_selection_is_skipped_under_the_lock() {
        let inner = Arc::new(InMemoryProductRepository::new());
        let now = Utc::now();
        repo_insert_on_sale(&inner, ProductId::new(1), now);

        // The query claims the product is still Pending; the lock-side
        // re-check sees OnSale and declines to transition.
        let repo = StaleQueryRepo {
            inner: Arc::clone(&inner),
            canned_ids: vec![ProductId::new(1)],
        };
        let sale_open = Sweep::new(
            "sale-open",
            ProductStatus::Pending,
            TimeGate::SaleOpens,
            ProductStatus::OnSale,
        );
        let runner = SweepRunner::with_sweeps(repo, vec![sale_open]);
        let reports = runner.run_once(Utc::now());
        assert_eq!(reports[0].skipped, 1);
        assert_eq!(reports[0].transitioned, 0);
        assert_eq!(reports[0].failed, 0);

        let stored = inner.find_by_id(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(stored.status(), ProductStatus::OnSale);
    }

    fn repo_insert_on_sale(repo: &InMemoryProductRepository, id: ProductId, now: DateTime<Utc>) {
        repo.insert(product(
            id,
            now - ChronoDuration::hours(2),
            ChronoDuration::hours(1),
            ChronoDuration::days(10),
            ChronoDuration::days(20),
        ))
        .unwrap();
        repo.update(id, |p| p.change_status(ProductStatus::Pending))
            .unwrap();
        repo.update(id, |p| p.change_status(ProductStatus::OnSale))
            .unwrap();
    }

    #[test]
    fn one_failing_candidate_does_not_block_the_rest() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let created = Utc::now() - ChronoDuration::days(30);
        for i in 1..=2 {
            repo.insert(product(
                ProductId::new(i),
                created,
                ChronoDuration::hours(1),
                ChronoDuration::days(25),
                ChronoDuration::days(40),
            ))
            .unwrap();
            repo.update(ProductId::new(i), |p| p.change_status(ProductStatus::Pending))
                .unwrap();
        }

        // A sweep with an illegal target fails on every candidate but still
        // visits them all.
        let bad = Sweep::new(
            "bad",
            ProductStatus::Pending,
            TimeGate::SaleOpens,
            ProductStatus::SoldOut,
        );
        let runner = SweepRunner::with_sweeps(Arc::clone(&repo), vec![bad]);
        let reports = runner.run_once(Utc::now());
        assert_eq!(reports[0].candidates, 2);
        assert_eq!(reports[0].failed, 2);
        assert_eq!(reports[0].transitioned, 0);
    }

    #[test]
    fn ticker_runs_sweeps_and_stops_cleanly() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let now = Utc::now();
        repo.insert(product(
            ProductId::new(1),
            now - ChronoDuration::hours(2),
            ChronoDuration::hours(1),
            ChronoDuration::days(10),
            ChronoDuration::days(20),
        ))
        .unwrap();
        repo.update(ProductId::new(1), |p| p.change_status(ProductStatus::Pending))
            .unwrap();

        let runner = SweepRunner::new(Arc::clone(&repo));
        let handle = spawn(
            runner,
            SchedulerConfig {
                tick_interval: Duration::from_millis(10),
            },
        );
        std::thread::sleep(Duration::from_millis(100));
        handle.stop();

        let stored = repo.find_by_id(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(stored.status(), ProductStatus::OnSale);
    }
}

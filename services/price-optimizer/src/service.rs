//! Price Optimizer Service
//!
//! Sweeps every configured distributor over the BOM and keeps the cheapest
//! verified offer per component.
//!
//! Distributors run strictly one after another. Within a pass every component
//! is looked up concurrently, bounded by a semaphore, and the pass fully drains
//! before its results are written back. The next pass therefore always sees the
//! previous pass's prices.

use partpal_models::{Bom, ProductRecord};
use partpal_utils::{AuthFailurePolicy, OptimizerConfig, PartPalResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::distributors::{Distributor, LookupError};

/// Tunables for a run
#[derive(Debug, Clone)]
pub struct OptimizerSettings {
    pub max_concurrent_lookups: usize,
    pub lookup_timeout: Duration,
    pub on_auth_failure: AuthFailurePolicy,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self::from(&OptimizerConfig::default())
    }
}

impl From<&OptimizerConfig> for OptimizerSettings {
    fn from(config: &OptimizerConfig) -> Self {
        Self {
            max_concurrent_lookups: config.max_concurrent_lookups.max(1),
            lookup_timeout: Duration::from_secs(config.lookup_timeout_seconds),
            on_auth_failure: config.on_auth_failure,
        }
    }
}

/// A lookup that did not produce an offer
#[derive(Debug, Clone)]
pub struct LookupFailure {
    /// 1-based BOM row
    pub row: usize,
    pub part_number: String,
    pub error: LookupError,
}

/// Outcome of one distributor's pass
#[derive(Debug, Clone)]
pub struct PassSummary {
    pub distributor: String,
    /// Authentication failed and the distributor was left out
    pub skipped: bool,
    pub attempted: usize,
    pub succeeded: usize,
    pub improved: usize,
    pub failures: Vec<LookupFailure>,
    /// Grand total once this pass's offers were written back
    pub total_after: f64,
}

impl PassSummary {
    fn new(distributor: &str) -> Self {
        Self {
            distributor: distributor.to_string(),
            skipped: false,
            attempted: 0,
            succeeded: 0,
            improved: 0,
            failures: Vec::new(),
            total_after: 0.0,
        }
    }
}

/// Result of a full optimization run
#[derive(Debug, Clone)]
pub struct OptimizationReport {
    pub run_id: Uuid,
    pub bom: Bom,
    pub passes: Vec<PassSummary>,
}

impl OptimizationReport {
    /// Grand total after optimization
    pub fn total_cost(&self) -> f64 {
        self.bom.total_cost()
    }

    pub fn improved(&self) -> usize {
        self.passes.iter().map(|p| p.improved).sum()
    }
}

/// Price optimizer
#[derive(Debug, Clone, Default)]
pub struct PriceOptimizer {
    settings: OptimizerSettings,
}

impl PriceOptimizer {
    pub fn new(settings: OptimizerSettings) -> Self {
        Self { settings }
    }

    /// Run one pass per distributor, in order, and return the updated BOM.
    ///
    /// Lookup failures never abort the run. Authentication failures follow the
    /// configured policy: skipped distributors are reported, `Abort` returns the
    /// authentication error.
    pub async fn optimize(&self, bom: Bom, distributors: &[Arc<dyn Distributor>]) -> PartPalResult<OptimizationReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("optimize", %run_id, rows = bom.len(), distributors = distributors.len());

        async move {
            let mut bom = bom;
            let mut passes = Vec::with_capacity(distributors.len());
            let starting_total = bom.total_cost();

            for distributor in distributors {
                let pass = self.run_pass(&mut bom, distributor).await?;
                passes.push(pass);
            }

            info!(
                starting_total,
                final_total = bom.total_cost(),
                "Optimization finished"
            );

            Ok(OptimizationReport { run_id, bom, passes })
        }
        .instrument(span)
        .await
    }

    /// One distributor against every component
    async fn run_pass(&self, bom: &mut Bom, distributor: &Arc<dyn Distributor>) -> PartPalResult<PassSummary> {
        let name = distributor.name().to_string();
        let mut summary = PassSummary::new(&name);

        if let Err(e) = distributor.authenticate().await {
            match self.settings.on_auth_failure {
                AuthFailurePolicy::Skip => {
                    warn!(distributor = %name, error = %e, "Authentication failed, skipping distributor");
                    summary.skipped = true;
                    summary.total_after = bom.total_cost();
                    return Ok(summary);
                }
                AuthFailurePolicy::Abort => {
                    warn!(distributor = %name, error = %e, "Authentication failed, aborting run");
                    return Err(e);
                }
            }
        }

        info!(distributor = %name, lookups = bom.len(), "Starting pass");
        let results = self.fan_out(bom, distributor).await;
        summary.attempted = results.len();

        // Barrier reached: every lookup of this pass has completed
        for (idx, (component, result)) in bom.components.iter_mut().zip(results).enumerate() {
            match result {
                Ok(record) => {
                    summary.succeeded += 1;
                    if component.is_improved_by(record.unit_price) {
                        debug!(
                            distributor = %name,
                            row = idx + 1,
                            part_number = %component.part_number,
                            previous = %component.cost,
                            offer = record.unit_price,
                            "Cheaper offer found"
                        );
                        component.apply_offer(record.unit_price, &name);
                        summary.improved += 1;
                    }
                }
                Err(error) => {
                    if matches!(error, LookupError::EmptyPartNumber) {
                        debug!(distributor = %name, row = idx + 1, "Skipping row without part number");
                    } else {
                        warn!(
                            distributor = %name,
                            row = idx + 1,
                            part_number = %component.part_number,
                            error = %error,
                            raw_payload = error.raw_payload().unwrap_or(""),
                            "Lookup failed"
                        );
                    }
                    summary.failures.push(LookupFailure {
                        row: idx + 1,
                        part_number: component.part_number.clone(),
                        error,
                    });
                }
            }
        }

        summary.total_after = bom.total_cost();
        info!(
            distributor = %name,
            succeeded = summary.succeeded,
            improved = summary.improved,
            failed = summary.failures.len(),
            total = summary.total_after,
            "Pass finished"
        );

        Ok(summary)
    }

    /// Look up every component concurrently; results come back in row order
    async fn fan_out(&self, bom: &Bom, distributor: &Arc<dyn Distributor>) -> Vec<Result<ProductRecord, LookupError>> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_lookups));
        let timeout = self.settings.lookup_timeout;

        let handles: Vec<JoinHandle<Result<ProductRecord, LookupError>>> = bom
            .iter()
            .map(|component| {
                let distributor = Arc::clone(distributor);
                let semaphore = Arc::clone(&semaphore);
                let part_number = component.part_number.clone();

                tokio::spawn(
                    async move {
                        let _permit = semaphore
                            .acquire_owned()
                            .await
                            .map_err(|e| LookupError::Task(e.to_string()))?;

                        match tokio::time::timeout(timeout, distributor.lookup(&part_number)).await {
                            Ok(result) => result,
                            Err(_) => Err(LookupError::Timeout(timeout)),
                        }
                    }
                    .in_current_span(),
                )
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(LookupError::Task(e.to_string())),
            };
            results.push(result);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use partpal_models::Component;
    use partpal_utils::PartPalError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory distributor with canned prices
    struct FakeDistributor {
        name: String,
        prices: HashMap<String, f64>,
        auth_ok: bool,
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        lookups: AtomicUsize,
    }

    impl FakeDistributor {
        fn new(name: &str, prices: &[(&str, f64)]) -> Self {
            Self {
                name: name.to_string(),
                prices: prices.iter().map(|(pn, p)| (pn.to_string(), *p)).collect(),
                auth_ok: true,
                delay: Duration::ZERO,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                lookups: AtomicUsize::new(0),
            }
        }

        fn failing_auth(mut self) -> Self {
            self.auth_ok = false;
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl Distributor for FakeDistributor {
        fn name(&self) -> &str {
            &self.name
        }

        async fn authenticate(&self) -> PartPalResult<()> {
            if self.auth_ok {
                Ok(())
            } else {
                Err(PartPalError::authentication(&self.name, "invalid client"))
            }
        }

        async fn lookup(&self, part_number: &str) -> Result<ProductRecord, LookupError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if part_number == "PANIC" {
                panic!("backend exploded");
            }

            match self.prices.get(part_number) {
                Some(&unit_price) => Ok(ProductRecord {
                    part_number: format!("{}-{}", self.name, part_number),
                    mfr_part_number: part_number.to_string(),
                    manufacturer: "Acme".to_string(),
                    unit_price,
                    availability: 100,
                    description: "test part".to_string(),
                    datasheet: String::new(),
                    product_url: String::new(),
                }),
                None => Err(LookupError::NotFound {
                    part_number: part_number.to_string(),
                    body: "{\"SearchResults\":null}".to_string(),
                }),
            }
        }
    }

    fn component(part_number: &str, quantity: &str, cost: &str) -> Component {
        Component {
            part_number: part_number.to_string(),
            quantity: quantity.to_string(),
            cost: cost.to_string(),
            ..Default::default()
        }
    }

    fn distributors(list: Vec<FakeDistributor>) -> Vec<Arc<dyn Distributor>> {
        list.into_iter()
            .map(|d| Arc::new(d) as Arc<dyn Distributor>)
            .collect()
    }

    #[tokio::test]
    async fn test_failed_lookup_then_cheaper_offer() {
        let bom = Bom::new(vec![component("ABC123", "5", "1.20")]);
        let list = distributors(vec![
            FakeDistributor::new("A", &[]),
            FakeDistributor::new("B", &[("ABC123", 0.90)]),
        ]);

        let report = PriceOptimizer::default().optimize(bom, &list).await.unwrap();

        assert_eq!(report.passes[0].failures.len(), 1);
        assert_eq!(report.passes[0].failures[0].row, 1);
        assert!(report.passes[0].failures[0].error.raw_payload().is_some());
        assert_eq!(report.bom.components[0].cost, "0.9");
        assert_eq!(report.bom.components[0].distributor, "B");
    }

    #[tokio::test]
    async fn test_equal_price_does_not_replace() {
        let mut original = component("ABC123", "1", "0.50");
        original.distributor = "Local".to_string();
        let list = distributors(vec![FakeDistributor::new("A", &[("ABC123", 0.50)])]);

        let report = PriceOptimizer::default().optimize(Bom::new(vec![original.clone()]), &list).await.unwrap();

        assert_eq!(report.bom.components[0], original);
        assert_eq!(report.passes[0].succeeded, 1);
        assert_eq!(report.passes[0].improved, 0);
    }

    #[tokio::test]
    async fn test_unset_cost_is_always_beaten() {
        let bom = Bom::new(vec![component("X1", "2", ""), component("X2", "2", "TBD")]);
        let list = distributors(vec![FakeDistributor::new("A", &[("X1", 99.0), ("X2", 1.5)])]);

        let report = PriceOptimizer::default().optimize(bom, &list).await.unwrap();

        assert_eq!(report.bom.components[0].cost, "99");
        assert_eq!(report.bom.components[1].cost, "1.5");
        assert!((report.total_cost() - 201.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_later_pass_sees_earlier_writes() {
        let bom = Bom::new(vec![component("P1", "1", "1.00"), component("P2", "2", "3.00")]);
        let list = distributors(vec![
            FakeDistributor::new("A", &[("P1", 0.50)]),
            FakeDistributor::new("B", &[("P1", 0.70), ("P2", 2.00)]),
        ]);

        let report = PriceOptimizer::default().optimize(bom, &list).await.unwrap();

        assert_eq!(report.bom.components[0].cost, "0.5");
        assert_eq!(report.bom.components[0].distributor, "A");
        assert_eq!(report.bom.components[1].distributor, "B");
        assert_eq!(report.passes[1].improved, 1);
        assert!((report.passes[0].total_after - 6.5).abs() < 1e-9);
        assert!((report.passes[1].total_after - 4.5).abs() < 1e-9);
        assert!((report.total_cost() - 4.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_final_price_independent_of_distributor_order() {
        let make_bom = || Bom::new(vec![
            component("P1", "1", "1.00"),
            component("P2", "3", "0.20"),
            component("P3", "2", ""),
        ]);
        let a = || FakeDistributor::new("A", &[("P1", 0.80), ("P2", 0.30), ("P3", 2.00)]);
        let b = || FakeDistributor::new("B", &[("P1", 0.60), ("P3", 2.50)]);

        let forward = PriceOptimizer::default()
            .optimize(make_bom(), &distributors(vec![a(), b()]))
            .await
            .unwrap();
        let backward = PriceOptimizer::default()
            .optimize(make_bom(), &distributors(vec![b(), a()]))
            .await
            .unwrap();

        let costs = |report: &OptimizationReport| {
            report.bom.iter().map(|c| c.unit_cost()).collect::<Vec<_>>()
        };
        assert_eq!(costs(&forward), vec![Some(0.60), Some(0.20), Some(2.00)]);
        assert_eq!(costs(&forward), costs(&backward));
    }

    #[tokio::test]
    async fn test_order_preserved_and_every_component_tried() {
        let bom = Bom::new(vec![
            component("P1", "1", ""),
            component("", "1", "0.10"),
            component("P3", "1", ""),
        ]);
        let fake = Arc::new(FakeDistributor::new("A", &[("P1", 1.0), ("P3", 3.0)]));
        let list: Vec<Arc<dyn Distributor>> = vec![fake.clone()];

        let report = PriceOptimizer::default().optimize(bom, &list).await.unwrap();

        let parts: Vec<&str> = report.bom.iter().map(|c| c.part_number.as_str()).collect();
        assert_eq!(parts, vec!["P1", "", "P3"]);
        assert_eq!(fake.lookups.load(Ordering::SeqCst), 3);
        assert_eq!(report.passes[0].attempted, 3);
        assert_eq!(report.bom.components[1].cost, "0.10");
    }

    #[tokio::test]
    async fn test_auth_failure_skip_policy() {
        let bom = Bom::new(vec![component("P1", "1", "1.00")]);
        let list = distributors(vec![
            FakeDistributor::new("A", &[("P1", 0.10)]).failing_auth(),
            FakeDistributor::new("B", &[("P1", 0.50)]),
        ]);

        let report = PriceOptimizer::default().optimize(bom, &list).await.unwrap();

        assert!(report.passes[0].skipped);
        assert_eq!(report.passes[0].attempted, 0);
        assert!((report.passes[0].total_after - 1.0).abs() < 1e-9);
        assert!((report.passes[1].total_after - 0.5).abs() < 1e-9);
        assert_eq!(report.bom.components[0].distributor, "B");
    }

    #[tokio::test]
    async fn test_auth_failure_abort_policy() {
        let settings = OptimizerSettings {
            on_auth_failure: AuthFailurePolicy::Abort,
            ..Default::default()
        };
        let bom = Bom::new(vec![component("P1", "1", "1.00")]);
        let list = distributors(vec![FakeDistributor::new("A", &[]).failing_auth()]);

        let err = PriceOptimizer::new(settings).optimize(bom, &list).await.unwrap_err();
        assert_eq!(err.error_code(), "AUTHENTICATION_ERROR");
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out_without_stalling_pass() {
        let settings = OptimizerSettings {
            lookup_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let bom = Bom::new(vec![component("P1", "1", "1.00")]);
        let list = distributors(vec![
            FakeDistributor::new("Slow", &[("P1", 0.10)]).with_delay(Duration::from_secs(30)),
        ]);

        let report = PriceOptimizer::new(settings).optimize(bom, &list).await.unwrap();

        assert!(matches!(report.passes[0].failures[0].error, LookupError::Timeout(_)));
        assert_eq!(report.bom.components[0].cost, "1.00");
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let settings = OptimizerSettings {
            max_concurrent_lookups: 2,
            ..Default::default()
        };
        let bom = Bom::new((0..10).map(|i| component(&format!("P{}", i), "1", "")).collect());
        let fake = Arc::new(FakeDistributor::new("A", &[]).with_delay(Duration::from_millis(20)));
        let list: Vec<Arc<dyn Distributor>> = vec![fake.clone()];

        PriceOptimizer::new(settings).optimize(bom, &list).await.unwrap();

        assert_eq!(fake.lookups.load(Ordering::SeqCst), 10);
        assert!(fake.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_panicking_lookup_is_a_row_failure() {
        let bom = Bom::new(vec![component("PANIC", "1", "1.00"), component("P2", "1", "")]);
        let list = distributors(vec![FakeDistributor::new("A", &[("P2", 0.25)])]);

        let report = PriceOptimizer::default().optimize(bom, &list).await.unwrap();

        assert!(matches!(report.passes[0].failures[0].error, LookupError::Task(_)));
        assert_eq!(report.bom.components[0].cost, "1.00");
        assert_eq!(report.bom.components[1].cost, "0.25");
    }

    #[tokio::test]
    async fn test_no_distributors_leaves_bom_untouched() {
        let bom = Bom::new(vec![component("P1", "4", "2.50"), component("P2", "3", "bad")]);
        let report = PriceOptimizer::default().optimize(bom.clone(), &[]).await.unwrap();

        assert_eq!(report.bom, bom);
        assert!(report.passes.is_empty());
        assert!((report.total_cost() - 10.0).abs() < 1e-9);
    }
}

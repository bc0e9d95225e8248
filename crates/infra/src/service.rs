//! Application service: the command-facing surface over the product domain.
//!
//! Orchestrates repository writes, the remote seat-provisioning call, the
//! cancellation fan-out, and action logging. Publication ordering is fixed:
//! state commits locally first, then events go out. A failed fan-out reports
//! a retryable error and never rolls back the committed state.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use boxoffice_core::{ProductId, UserId};
use boxoffice_events::bus::EventBus;
use boxoffice_events::envelope::EventEnvelope;
use boxoffice_events::outbound::ProductCancelled;
use boxoffice_events::routing::cancellation_fanout;
use boxoffice_product::{NewProduct, Product, ProductError, ProductStatus, SeatGrade, Venue};

use crate::log_sink::{ActionType, LogEventSink};
use crate::repository::{Page, PageRequest, ProductFilter, ProductRepository, RepositoryError};
use crate::seat_client::{SeatCreationClient, SeatCreationRequest};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("product not found: {0}")]
    NotFound(ProductId),
    #[error(transparent)]
    Product(ProductError),
    #[error("storage failure: {0}")]
    Storage(String),
    /// The product exists locally; only the remote provisioning call failed.
    #[error("seat provisioning failed for created product: {0}")]
    SeatProvisioning(String),
    /// The cancellation is committed locally; only publication failed.
    #[error("cancellation fan-out failed: {0}")]
    Publish(String),
}

impl ServiceError {
    /// Retryable errors left the local state consistent; the caller may
    /// safely re-drive the side effect.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::SeatProvisioning(_) | ServiceError::Publish(_)
        )
    }

    fn from_repo(id: ProductId, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound(id),
            RepositoryError::Domain(e) => ServiceError::Product(e),
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

/// Command-facing product service.
pub struct ProductService<R, B, L, C> {
    repo: R,
    bus: B,
    log_sink: L,
    seat_client: C,
}

impl<R, B, L, C> ProductService<R, B, L, C>
where
    R: ProductRepository,
    B: EventBus<EventEnvelope<ProductCancelled>>,
    L: LogEventSink,
    C: SeatCreationClient,
{
    pub fn new(repo: R, bus: B, log_sink: L, seat_client: C) -> Self {
        Self {
            repo,
            bus,
            log_sink,
            seat_client,
        }
    }

    /// Create a product and provision its seats remotely.
    ///
    /// The product is committed before the provisioning call; if the call
    /// fails the product stays created and the error is retryable.
    pub fn create(&self, spec: NewProduct, now: DateTime<Utc>) -> Result<Product, ServiceError> {
        let id = self.repo.allocate_id();
        let product = Product::create(id, spec, now).map_err(ServiceError::Product)?;
        self.repo
            .insert(product.clone())
            .map_err(|e| ServiceError::from_repo(id, e))?;
        self.log_sink.record(ActionType::Created, id);
        info!(product_id = id.value(), name = product.name(), "product created");

        let request = SeatCreationRequest::for_product(&product);
        if !request.seats.is_empty() {
            self.seat_client.create_seats(&request).map_err(|e| {
                warn!(product_id = id.value(), error = %e, "seat provisioning failed");
                ServiceError::SeatProvisioning(e.to_string())
            })?;
        }
        Ok(product)
    }

    pub fn change_status(
        &self,
        id: ProductId,
        target: ProductStatus,
    ) -> Result<Product, ServiceError> {
        let (previous, product) = self
            .repo
            .update(id, |p| {
                let previous = p.status();
                p.change_status(target)?;
                Ok((previous, p.clone()))
            })
            .map_err(|e| ServiceError::from_repo(id, e))?;
        self.log_sink.record(status_action(previous, target), id);
        Ok(product)
    }

    /// Cancel a product and fan the cancellation out to every downstream
    /// consumer.
    ///
    /// Each fanned-out envelope shares one correlation id. Publication happens
    /// after the cancellation is committed; any publish failure makes the
    /// whole fan-out report as failed (retryable), with the product already
    /// Cancelled locally.
    pub fn cancel(
        &self,
        id: ProductId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<Product, ServiceError> {
        let product = self
            .repo
            .update(id, |p| {
                p.cancel(actor, now)?;
                Ok(p.clone())
            })
            .map_err(|e| ServiceError::from_repo(id, e))?;
        self.log_sink.record(ActionType::Cancelled, id);
        info!(product_id = id.value(), "product cancelled");

        let correlation_id = Uuid::now_v7();
        let mut failures = Vec::new();
        for key in cancellation_fanout() {
            let envelope = EventEnvelope::wrap(ProductCancelled::new(id), correlation_id, now);
            if let Err(e) = self.bus.publish(&key, envelope) {
                warn!(product_id = id.value(), key = %key, error = ?e, "fan-out publish failed");
                failures.push(format!("{key}: {e:?}"));
            }
        }
        if !failures.is_empty() {
            return Err(ServiceError::Publish(failures.join("; ")));
        }
        Ok(product)
    }

    pub fn update_details(
        &self,
        id: ProductId,
        name: String,
        running_time_minutes: u32,
    ) -> Result<Product, ServiceError> {
        let product = self
            .repo
            .update(id, |p| {
                p.update_details(name, running_time_minutes)?;
                Ok(p.clone())
            })
            .map_err(|e| ServiceError::from_repo(id, e))?;
        self.log_sink.record(ActionType::DetailsUpdated, id);
        Ok(product)
    }

    pub fn change_venue(
        &self,
        id: ProductId,
        venue: Venue,
        now: DateTime<Utc>,
    ) -> Result<Product, ServiceError> {
        let product = self
            .repo
            .update(id, |p| {
                p.change_venue(venue, now)?;
                Ok(p.clone())
            })
            .map_err(|e| ServiceError::from_repo(id, e))?;
        self.log_sink.record(ActionType::VenueChanged, id);
        Ok(product)
    }

    pub fn add_grade(
        &self,
        id: ProductId,
        grade: SeatGrade,
        now: DateTime<Utc>,
    ) -> Result<Product, ServiceError> {
        let product = self
            .repo
            .update(id, |p| {
                p.add_grade(grade, now)?;
                Ok(p.clone())
            })
            .map_err(|e| ServiceError::from_repo(id, e))?;
        self.log_sink.record(ActionType::GradeAdded, id);
        Ok(product)
    }

    pub fn remove_grade(
        &self,
        id: ProductId,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Product, ServiceError> {
        let product = self
            .repo
            .update(id, |p| {
                p.remove_grade(name, now)?;
                Ok(p.clone())
            })
            .map_err(|e| ServiceError::from_repo(id, e))?;
        self.log_sink.record(ActionType::GradeRemoved, id);
        Ok(product)
    }

    pub fn record_view(&self, id: ProductId) -> Result<Product, ServiceError> {
        let product = self
            .repo
            .update(id, |p| {
                p.record_view()?;
                Ok(p.clone())
            })
            .map_err(|e| ServiceError::from_repo(id, e))?;
        self.log_sink.record(ActionType::ViewIncreased, id);
        Ok(product)
    }

    pub fn get(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.repo
            .find_by_id(id)
            .map_err(|e| ServiceError::from_repo(id, e))?
            .ok_or(ServiceError::NotFound(id))
    }

    pub fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, ServiceError> {
        self.repo
            .find_page(filter, page)
            .map_err(|e| ServiceError::Storage(e.to_string()))
    }
}

/// Map a committed status transition to its audit action.
fn status_action(previous: ProductStatus, target: ProductStatus) -> ActionType {
    match target {
        ProductStatus::Draft => ActionType::ReturnedToDraft,
        ProductStatus::Pending => ActionType::Approved,
        ProductStatus::OnSale if previous == ProductStatus::SoldOut => ActionType::SaleReopened,
        ProductStatus::OnSale => ActionType::SaleOpened,
        ProductStatus::SoldOut => ActionType::SoldOut,
        ProductStatus::Cancelled => ActionType::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_sink::{NoopLogSink, RecordingLogSink};
    use crate::repository::InMemoryProductRepository;
    use crate::seat_client::{RecordingSeatClient, SeatClientError};
    use boxoffice_core::Entity;
    use boxoffice_events::in_memory_bus::InMemoryEventBus;
    use boxoffice_events::routing::{self, RoutingKey};
    use boxoffice_product::{ProductType, SaleSchedule, Schedule};
    use chrono::Duration;
    use std::sync::Arc;

    type CancelBus = InMemoryEventBus<EventEnvelope<ProductCancelled>>;

    fn sample_spec(now: DateTime<Utc>) -> NewProduct {
        NewProduct {
            owner: UserId::new(),
            name: "Spring Recital".to_string(),
            product_type: ProductType::Musical,
            running_time_minutes: 150,
            event_schedule: Schedule::new(now + Duration::days(30), now + Duration::days(30) + Duration::hours(3)).unwrap(),
            sale_schedule: SaleSchedule::new(now + Duration::days(1), now + Duration::days(29)).unwrap(),
            venue: None,
            grades: vec![SeatGrade::new("VIP", 20_000, 3, 0).unwrap()],
            total_seats: None,
            content: None,
            booking_policy: None,
            admission_policy: None,
            refund_policy: None,
            age_restriction: None,
        }
    }

    fn service() -> ProductService<
        Arc<InMemoryProductRepository>,
        Arc<CancelBus>,
        Arc<RecordingLogSink>,
        Arc<RecordingSeatClient>,
    > {
        ProductService::new(
            Arc::new(InMemoryProductRepository::new()),
            Arc::new(CancelBus::new()),
            Arc::new(RecordingLogSink::new()),
            Arc::new(RecordingSeatClient::new()),
        )
    }

    #[test]
    fn create_provisions_seats_and_logs() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let sink = Arc::new(RecordingLogSink::new());
        let client = Arc::new(RecordingSeatClient::new());
        let service = ProductService::new(
            Arc::clone(&repo),
            Arc::new(CancelBus::new()),
            Arc::clone(&sink),
            Arc::clone(&client),
        );

        let product = service.create(sample_spec(Utc::now()), Utc::now()).unwrap();
        assert_eq!(product.status(), ProductStatus::Draft);

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].seats.len(), 3);
        assert_eq!(sink.entries()[0].0, ActionType::Created);
    }

    struct FailingSeatClient;

    impl SeatCreationClient for FailingSeatClient {
        fn create_seats(&self, _request: &SeatCreationRequest) -> Result<(), SeatClientError> {
            Err(SeatClientError::Unavailable("connection refused".to_string()))
        }
    }

    #[test]
    fn provisioning_failure_leaves_product_created_and_is_retryable() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let service = ProductService::new(
            Arc::clone(&repo),
            Arc::new(CancelBus::new()),
            NoopLogSink,
            FailingSeatClient,
        );

        let err = service.create(sample_spec(Utc::now()), Utc::now()).unwrap_err();
        assert!(matches!(err, ServiceError::SeatProvisioning(_)));
        assert!(err.is_retryable());

        // The product survived the failed provisioning call.
        let stored = repo.find_by_id(ProductId::new(1)).unwrap();
        assert!(stored.is_some());
    }

    #[test]
    fn cancel_fans_out_both_events_with_shared_correlation() {
        let bus = Arc::new(CancelBus::new());
        let reservation_sub =
            bus.subscribe(&RoutingKey::new(routing::PRODUCT_CANCELLED_RESERVATION));
        let seat_sub =
            bus.subscribe(&RoutingKey::new(routing::PRODUCT_CANCELLED_RESERVATION_SEAT));

        let service = ProductService::new(
            Arc::new(InMemoryProductRepository::new()),
            Arc::clone(&bus),
            Arc::new(RecordingLogSink::new()),
            Arc::new(RecordingSeatClient::new()),
        );

        let now = Utc::now();
        let product = service.create(sample_spec(now), now).unwrap();
        let id = *product.id();
        let cancelled = service.cancel(id, UserId::new(), now).unwrap();
        assert_eq!(cancelled.status(), ProductStatus::Cancelled);

        let a = reservation_sub.try_recv().unwrap();
        let b = seat_sub.try_recv().unwrap();
        assert_eq!(a.payload().product_id, id);
        assert_eq!(b.payload().product_id, id);
        assert_eq!(a.correlation_id(), b.correlation_id());
        assert_ne!(a.event_id(), b.event_id());
    }

    #[test]
    fn cancel_of_cancelled_product_reports_domain_error() {
        let service = service();
        let now = Utc::now();
        let product = service.create(sample_spec(now), now).unwrap();
        let id = *product.id();

        service.cancel(id, UserId::new(), now).unwrap();
        let err = service.cancel(id, UserId::new(), now).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Product(ProductError::AlreadyCancelled { .. })
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn status_actions_distinguish_reopening() {
        assert_eq!(
            status_action(ProductStatus::Pending, ProductStatus::OnSale),
            ActionType::SaleOpened
        );
        assert_eq!(
            status_action(ProductStatus::SoldOut, ProductStatus::OnSale),
            ActionType::SaleReopened
        );
        assert_eq!(
            status_action(ProductStatus::Draft, ProductStatus::Pending),
            ActionType::Approved
        );
        assert_eq!(
            status_action(ProductStatus::Pending, ProductStatus::Draft),
            ActionType::ReturnedToDraft
        );
    }

    #[test]
    fn get_maps_missing_product_to_not_found() {
        let service = service();
        let err = service.get(ProductId::new(42)).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(id) if id == ProductId::new(42)));
    }
}

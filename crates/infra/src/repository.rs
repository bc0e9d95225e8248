//! Product storage with per-aggregate mutual exclusion.
//!
//! Three actors mutate the same product concurrently (owner commands, the
//! seat-event consumer, the scheduler). The repository serializes writes per
//! aggregate: `update` runs a closure against a working copy under that
//! product's lock and commits only when the closure succeeds, so a rejected
//! operation never leaves a half-applied aggregate behind.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use boxoffice_core::{Entity, ProductId, UserId};
use boxoffice_product::{Product, ProductError, ProductStatus};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("product not found")]
    NotFound,
    #[error("product already exists: {0}")]
    Duplicate(ProductId),
    #[error(transparent)]
    Domain(#[from] ProductError),
    #[error("repository lock poisoned")]
    Poisoned,
}

/// Query filter; all present fields must match. Time bounds are inclusive,
/// matching the scheduler's "gate has passed" reading.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub status: Option<ProductStatus>,
    pub owner: Option<UserId>,
    pub sale_opens_before: Option<DateTime<Utc>>,
    pub sale_closes_before: Option<DateTime<Utc>>,
    pub event_ends_before: Option<DateTime<Utc>>,
}

impl ProductFilter {
    pub fn by_status(status: ProductStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(status) = self.status {
            if product.status() != status {
                return false;
            }
        }
        if let Some(owner) = self.owner {
            if product.owner() != owner {
                return false;
            }
        }
        if let Some(t) = self.sale_opens_before {
            if product.sale_schedule().opens_at() > t {
                return false;
            }
        }
        if let Some(t) = self.sale_closes_before {
            if product.sale_schedule().closes_at() > t {
                return false;
            }
        }
        if let Some(t) = self.event_ends_before {
            if product.event_schedule().ends_at() > t {
                return false;
            }
        }
        true
    }
}

/// Zero-based page request. A zero size is bumped to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    size: usize,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size: size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self, size: usize) -> usize {
        self.total_items.div_ceil(size.max(1))
    }
}

/// Storage contract for products.
///
/// `update` is the single write path for existing aggregates: it owns the
/// per-product lock, hands the closure a working copy, and commits the copy
/// only when the closure returns `Ok`.
pub trait ProductRepository: Send + Sync {
    fn allocate_id(&self) -> ProductId;

    fn insert(&self, product: Product) -> Result<(), RepositoryError>;

    fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    fn find_ids(&self, filter: &ProductFilter) -> Result<Vec<ProductId>, RepositoryError>;

    fn find_page(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError>;

    fn update<T>(
        &self,
        id: ProductId,
        f: impl FnOnce(&mut Product) -> Result<T, ProductError>,
    ) -> Result<T, RepositoryError>;
}

impl<R> ProductRepository for Arc<R>
where
    R: ProductRepository,
{
    fn allocate_id(&self) -> ProductId {
        (**self).allocate_id()
    }

    fn insert(&self, product: Product) -> Result<(), RepositoryError> {
        (**self).insert(product)
    }

    fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        (**self).find_by_id(id)
    }

    fn find_ids(&self, filter: &ProductFilter) -> Result<Vec<ProductId>, RepositoryError> {
        (**self).find_ids(filter)
    }

    fn find_page(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        (**self).find_page(filter, page)
    }

    fn update<T>(
        &self,
        id: ProductId,
        f: impl FnOnce(&mut Product) -> Result<T, ProductError>,
    ) -> Result<T, RepositoryError> {
        (**self).update(id, f)
    }
}

/// In-memory repository: a map of independently locked aggregates.
///
/// The outer `RwLock` guards the map shape only; each product carries its own
/// `Mutex`, so updates to different products never contend.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<ProductId, Arc<Mutex<Product>>>>,
    next_id: AtomicU64,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self {
            products: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn slot(&self, id: ProductId) -> Result<Arc<Mutex<Product>>, RepositoryError> {
        let products = self.products.read().map_err(|_| RepositoryError::Poisoned)?;
        products.get(&id).cloned().ok_or(RepositoryError::NotFound)
    }

    fn snapshot_matching(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().map_err(|_| RepositoryError::Poisoned)?;
        let mut matching = Vec::new();
        for slot in products.values() {
            let product = slot.lock().map_err(|_| RepositoryError::Poisoned)?;
            if filter.matches(&product) {
                matching.push(product.clone());
            }
        }
        matching.sort_by_key(|p| *p.id());
        Ok(matching)
    }
}

impl ProductRepository for InMemoryProductRepository {
    fn allocate_id(&self) -> ProductId {
        ProductId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, product: Product) -> Result<(), RepositoryError> {
        let id = *product.id();
        let mut products = self.products.write().map_err(|_| RepositoryError::Poisoned)?;
        if products.contains_key(&id) {
            return Err(RepositoryError::Duplicate(id));
        }
        products.insert(id, Arc::new(Mutex::new(product)));
        Ok(())
    }

    fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        match self.slot(id) {
            Ok(slot) => {
                let product = slot.lock().map_err(|_| RepositoryError::Poisoned)?;
                Ok(Some(product.clone()))
            }
            Err(RepositoryError::NotFound) => Ok(None),
            Err(other) => Err(other),
        }
    }

    fn find_ids(&self, filter: &ProductFilter) -> Result<Vec<ProductId>, RepositoryError> {
        Ok(self
            .snapshot_matching(filter)?
            .iter()
            .map(|p| *p.id())
            .collect())
    }

    fn find_page(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let matching = self.snapshot_matching(filter)?;
        let total_items = matching.len();
        let items = matching
            .into_iter()
            .skip(page.page() * page.size())
            .take(page.size())
            .collect();
        Ok(Page {
            items,
            page: page.page(),
            total_items,
        })
    }

    fn update<T>(
        &self,
        id: ProductId,
        f: impl FnOnce(&mut Product) -> Result<T, ProductError>,
    ) -> Result<T, RepositoryError> {
        let slot = self.slot(id)?;
        let mut current = slot.lock().map_err(|_| RepositoryError::Poisoned)?;
        let mut working = current.clone();
        let out = f(&mut working)?;
        *current = working;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_product::{NewProduct, ProductType, SaleSchedule, Schedule, SeatGrade};
    use chrono::Duration;

    fn sample(id: ProductId, now: DateTime<Utc>) -> Product {
        let spec = NewProduct {
            owner: UserId::new(),
            name: format!("Listing {}", id.value()),
            product_type: ProductType::Play,
            running_time_minutes: 90,
            event_schedule: Schedule::new(now + Duration::days(10), now + Duration::days(10) + Duration::hours(2)).unwrap(),
            sale_schedule: SaleSchedule::new(now + Duration::days(1), now + Duration::days(9)).unwrap(),
            venue: None,
            grades: vec![SeatGrade::new("A", 10_000, 50, 0).unwrap()],
            total_seats: None,
            content: None,
            booking_policy: None,
            admission_policy: None,
            refund_policy: None,
            age_restriction: None,
        };
        Product::create(id, spec, now).unwrap()
    }

    #[test]
    fn allocate_id_is_monotonic() {
        let repo = InMemoryProductRepository::new();
        let a = repo.allocate_id();
        let b = repo.allocate_id();
        assert!(b.value() > a.value());
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let repo = InMemoryProductRepository::new();
        let now = Utc::now();
        repo.insert(sample(ProductId::new(1), now)).unwrap();
        let err = repo.insert(sample(ProductId::new(1), now)).unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));
    }

    #[test]
    fn update_commits_only_on_success() {
        let repo = InMemoryProductRepository::new();
        let now = Utc::now();
        repo.insert(sample(ProductId::new(1), now)).unwrap();

        // A closure that fails partway commits nothing, even the earlier step.
        let err = repo.update(ProductId::new(1), |p| {
            p.change_status(ProductStatus::Pending)?;
            p.change_status(ProductStatus::SoldOut)
        });
        assert!(err.is_err());
        let stored = repo.find_by_id(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(stored.status(), ProductStatus::Draft);

        // Successful closure: committed.
        repo.update(ProductId::new(1), |p| p.change_status(ProductStatus::Pending))
            .unwrap();
        let stored = repo.find_by_id(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(stored.status(), ProductStatus::Pending);
    }

    #[test]
    fn update_of_missing_product_reports_not_found() {
        let repo = InMemoryProductRepository::new();
        let err = repo
            .update(ProductId::new(9), |p| p.record_view())
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[test]
    fn filter_narrows_by_status_and_time() {
        let repo = InMemoryProductRepository::new();
        let now = Utc::now();
        repo.insert(sample(ProductId::new(1), now)).unwrap();
        repo.insert(sample(ProductId::new(2), now)).unwrap();
        repo.update(ProductId::new(2), |p| p.change_status(ProductStatus::Pending))
            .unwrap();

        let drafts = repo
            .find_ids(&ProductFilter::by_status(ProductStatus::Draft))
            .unwrap();
        assert_eq!(drafts, vec![ProductId::new(1)]);

        // Sale opens at now + 1 day, so the gate has not passed yet.
        let mut filter = ProductFilter::by_status(ProductStatus::Pending);
        filter.sale_opens_before = Some(now);
        assert!(repo.find_ids(&filter).unwrap().is_empty());

        filter.sale_opens_before = Some(now + Duration::days(2));
        assert_eq!(repo.find_ids(&filter).unwrap(), vec![ProductId::new(2)]);
    }

    #[test]
    fn pages_are_stable_and_counted() {
        let repo = InMemoryProductRepository::new();
        let now = Utc::now();
        for i in 1..=5 {
            repo.insert(sample(ProductId::new(i), now)).unwrap();
        }

        let page = repo
            .find_page(&ProductFilter::default(), PageRequest::new(1, 2))
            .unwrap();
        assert_eq!(page.total_items, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(*page.items[0].id(), ProductId::new(3));
        assert_eq!(page.total_pages(2), 3);
    }
}

//! In-memory master-detail store.
//!
//! Owns the header and line collections plus the reference catalog. The store
//! is an explicit object constructed once from seed data and shared by handle
//! (`Arc<RebateStore>`); there is no global instance. The logic is
//! synchronous and assumes one in-flight mutation at a time — a multi-writer
//! host must serialize callers and wrap each line-mutation-plus-recompute
//! sequence in its own transaction to keep the sum invariant.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::config::StoreConfig;
use crate::entities::rebate::{RebateApplication, RebateLine};
use crate::pricing::{compute_line_amount, PricingMethod};
use crate::seed::SeedData;

pub struct RebateStore {
    config: StoreConfig,
    catalog: Arc<Catalog>,
    headers: DashMap<Uuid, RebateApplication>,
    lines: DashMap<Uuid, RebateLine>,
    /// Insertion-ordered line ids per header.
    header_lines: DashMap<Uuid, Vec<Uuid>>,
    /// `{prefix}{YYYYMM}`, fixed at construction.
    number_prefix: String,
    number_seq: AtomicU64,
}

impl RebateStore {
    /// Builds the store from seed data.
    ///
    /// Seeded line amounts and header aggregates are recomputed on load so
    /// the invariants hold from the first instant, and the application-number
    /// sequence starts past the largest seeded number. Seeded foreign keys
    /// are taken as-is: a dangling reference degrades at query time, it does
    /// not fail the load.
    pub fn from_seed(config: StoreConfig, seed: SeedData) -> Arc<Self> {
        let catalog = Arc::new(Catalog::from_seed(&seed));
        let number_prefix = format!(
            "{}{}",
            config.application_number_prefix,
            Utc::now().format("%Y%m")
        );

        let store = Arc::new(Self {
            config,
            catalog,
            headers: DashMap::new(),
            lines: DashMap::new(),
            header_lines: DashMap::new(),
            number_prefix,
            number_seq: AtomicU64::new(0),
        });

        let mut max_seq = 0u64;
        for header in seed.rebates {
            if let Some(seq) = store.parse_number_seq(&header.application_number) {
                max_seq = max_seq.max(seq);
            }
            store.header_lines.entry(header.id).or_default();
            store.headers.insert(header.id, header);
        }
        store.number_seq.store(max_seq, Ordering::SeqCst);

        for mut line in seed.rebate_lines {
            if !store.headers.contains_key(&line.rebate_application_id) {
                warn!(
                    line_id = %line.id,
                    header_id = %line.rebate_application_id,
                    "Skipping seeded line: owning header not found"
                );
                continue;
            }
            let method = store.pricing_method_for(&line.application_type_id);
            line.item_rebate_amount = compute_line_amount(
                method,
                line.price,
                line.quantity,
                line.rebate_price,
                line.rebate_rate,
            );
            store.insert_line(line);
        }

        let header_ids: Vec<Uuid> = store.headers.iter().map(|e| *e.key()).collect();
        for id in &header_ids {
            store.recompute_aggregates(*id);
        }

        debug!(
            headers = store.headers.len(),
            lines = store.lines.len(),
            next_seq = max_seq + 1,
            "Rebate store seeded"
        );
        store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolves an application type id to its pricing formula. Unknown ids
    /// map to `None`, which the calculator treats as a zero-amount warning.
    pub(crate) fn pricing_method_for(&self, application_type_id: &str) -> Option<PricingMethod> {
        self.catalog
            .application_type_by_id(application_type_id)
            .map(|t| t.pricing_method)
    }

    // Application numbers

    fn parse_number_seq(&self, number: &str) -> Option<u64> {
        number.strip_prefix(&self.number_prefix)?.parse().ok()
    }

    /// Next application number: `{prefix}{YYYYMM}{seq:03}`. The sequence is
    /// atomic, so numbers are unique and strictly increasing in insertion
    /// order; past 999 the sequence simply grows a digit.
    pub(crate) fn next_application_number(&self) -> String {
        let seq = self.number_seq.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}{:03}", self.number_prefix, seq)
    }

    // Headers

    pub(crate) fn insert_header(&self, header: RebateApplication) {
        self.header_lines.entry(header.id).or_default();
        self.headers.insert(header.id, header);
    }

    pub(crate) fn replace_header(&self, header: RebateApplication) {
        self.headers.insert(header.id, header);
    }

    pub fn get_header(&self, id: Uuid) -> Option<RebateApplication> {
        self.headers.get(&id).map(|h| h.clone())
    }

    pub fn contains_header(&self, id: Uuid) -> bool {
        self.headers.contains_key(&id)
    }

    pub(crate) fn header_entry_mut(
        &self,
        id: Uuid,
    ) -> Option<dashmap::mapref::one::RefMut<'_, Uuid, RebateApplication>> {
        self.headers.get_mut(&id)
    }

    /// Removes a header and cascades to its owned lines. No recompute: the
    /// header is gone. Returns `false` when the id was unknown.
    pub(crate) fn remove_header(&self, id: Uuid) -> bool {
        if self.headers.remove(&id).is_none() {
            return false;
        }
        if let Some((_, line_ids)) = self.header_lines.remove(&id) {
            for line_id in line_ids {
                self.lines.remove(&line_id);
            }
        }
        true
    }

    pub fn headers_snapshot(&self) -> Vec<RebateApplication> {
        self.headers.iter().map(|e| e.value().clone()).collect()
    }

    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    // Lines

    pub(crate) fn insert_line(&self, line: RebateLine) {
        self.header_lines
            .entry(line.rebate_application_id)
            .or_default()
            .push(line.id);
        self.lines.insert(line.id, line);
    }

    pub(crate) fn replace_line(&self, line: RebateLine) {
        self.lines.insert(line.id, line);
    }

    pub fn get_line(&self, id: Uuid) -> Option<RebateLine> {
        self.lines.get(&id).map(|l| l.clone())
    }

    pub(crate) fn remove_line(&self, id: Uuid) -> Option<RebateLine> {
        let (_, line) = self.lines.remove(&id)?;
        if let Some(mut ids) = self.header_lines.get_mut(&line.rebate_application_id) {
            ids.retain(|line_id| *line_id != id);
        }
        Some(line)
    }

    /// Live lines of a header in insertion order.
    pub fn lines_for_header(&self, header_id: Uuid) -> Vec<RebateLine> {
        let ids: Vec<Uuid> = match self.header_lines.get(&header_id) {
            Some(entry) => entry.clone(),
            None => return Vec::new(),
        };
        ids.iter()
            .filter_map(|id| self.lines.get(id).map(|l| l.clone()))
            .collect()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

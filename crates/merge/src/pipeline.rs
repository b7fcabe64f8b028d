//! Pipeline orchestration: identity reconciliation → reference resolution →
//! summary building, in that fixed order.
//!
//! No stage aborts the run. Fallible stages are isolated at their boundary:
//! a summary whose prerequisites are missing yields an empty table plus a
//! recorded error while the remaining summaries still complete. Warnings
//! accumulate in order and are queryable at any point.

use std::collections::BTreeMap;

use crate::error::MergeError;
use crate::identity;
use crate::model::{MergeMeta, MergeOutput, Table};
use crate::resolve::{self, FallbackKey};
use crate::summary;

/// Pre-parsed input datasets. The transactions ledger is optional.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub people_primary: Table,
    pub people_secondary: Table,
    pub promotions: Table,
    pub transfers: Table,
    pub transactions: Option<Table>,
}

#[derive(Debug, Default)]
pub struct Pipeline {
    warnings: Vec<String>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings recorded so far, in emission order.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn run(&mut self, input: &PipelineInput) -> MergeOutput {
        let mut tables: BTreeMap<String, Table> = BTreeMap::new();

        let (people, w) = identity::reconcile(&input.people_primary, &input.people_secondary);
        self.warnings.extend(w);

        let promotion_fallbacks = [
            FallbackKey::new("client_email", "email"),
            FallbackKey::new("telephone", "phone"),
        ];
        let (promotions, w) = resolve::resolve(
            &people,
            &input.promotions,
            "promotions",
            "user_id",
            &promotion_fallbacks,
        );
        self.warnings.extend(w);

        let transactions = input.transactions.as_ref().map(|t| {
            let (resolved, w) = resolve::resolve(
                &people,
                t,
                "transactions",
                "user_id",
                &[FallbackKey::new("phone", "phone")],
            );
            self.warnings.extend(w);
            resolved
        });

        // An absent transactions dataset behaves as an empty ledger with the
        // full schema: per-user summaries complete to zeros and the item and
        // store summaries come out empty, without spurious errors.
        let txn_view = transactions.clone().unwrap_or_else(empty_transactions);

        let user_transactions = self.stage(
            "user_transactions",
            summary::user_transactions(&txn_view, &people),
        );
        let user_transfers = self.stage(
            "user_transfers",
            summary::user_transfers(&input.transfers, &people),
        );
        let item_summary = self.stage("item_summary", summary::item_summary(&txn_view));
        let store_summary = self.stage("store_summary", summary::store_summary(&txn_view));

        tables.insert("people".into(), people);
        tables.insert("promotions".into(), promotions);
        if let Some(t) = transactions {
            tables.insert("transactions".into(), t);
        }
        tables.insert("user_transactions".into(), user_transactions);
        tables.insert("user_transfers".into(), user_transfers);
        tables.insert("item_summary".into(), item_summary);
        tables.insert("store_summary".into(), store_summary);

        MergeOutput {
            meta: MergeMeta {
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            tables,
            warnings: self.warnings.clone(),
        }
    }

    /// Stage boundary: an `Err` becomes an empty table plus a recorded
    /// error; the pipeline carries on.
    fn stage(&mut self, name: &str, result: Result<(Table, Vec<String>), MergeError>) -> Table {
        match result {
            Ok((table, w)) => {
                self.warnings.extend(w);
                table
            }
            Err(e) => {
                self.warnings.push(format!("{name}: {e}"));
                Table::empty()
            }
        }
    }
}

fn empty_transactions() -> Table {
    Table::new(["transaction_id", "user_id", "item", "store", "price", "quantity"])
}

/// Run the full pipeline over `input`.
pub fn run(input: &PipelineInput) -> MergeOutput {
    Pipeline::new().run(input)
}

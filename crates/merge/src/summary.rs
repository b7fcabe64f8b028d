//! Derived summary views: per-user transactions, per-user transfers,
//! per-item, and per-store.
//!
//! The per-user views are left-completed against the canonical identity
//! table, so every person has exactly one row even with zero related
//! activity (numeric aggregates filled with 0, favorites with null).

use std::collections::{BTreeSet, HashMap};

use crate::aggregate::{group_by, GroupSpec, Reduce};
use crate::error::MergeError;
use crate::model::{Table, Value};

const USER_TRANSACTION_COLUMNS: [&str; 5] = ["user_id", "transaction_id", "price", "item", "store"];
const TRANSFER_COLUMNS: [&str; 4] = ["transfer_id", "sender_id", "recipient_id", "amount"];
const ITEM_COLUMNS: [&str; 4] = ["item", "price", "quantity", "transaction_id"];
const STORE_COLUMNS: [&str; 5] = ["store", "item", "price", "quantity", "transaction_id"];

fn require_columns(name: &str, table: &Table, required: &[&str]) -> Result<(), MergeError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MergeError::MissingColumns {
            table: name.into(),
            columns: missing,
        })
    }
}

/// One row per person: total spent, distinct transaction count, favorite
/// store and item.
pub fn user_transactions(
    transactions: &Table,
    people: &Table,
) -> Result<(Table, Vec<String>), MergeError> {
    require_columns("transactions", transactions, &USER_TRANSACTION_COLUMNS)?;

    let spec = GroupSpec {
        group_key: "user_id".into(),
        outputs: vec![
            ("total_spent".into(), Reduce::sum("price")),
            ("transaction_count".into(), Reduce::distinct_count("transaction_id")),
            ("favorite_store".into(), Reduce::mode("store")),
            ("favorite_item".into(), Reduce::mode("item")),
        ],
    };
    let (grouped, warnings) = group_by(transactions, &spec)?;

    let completed = complete_per_person(
        people,
        &grouped,
        &[
            ("total_spent", Value::Int(0)),
            ("transaction_count", Value::Int(0)),
            ("favorite_store", Value::Null),
            ("favorite_item", Value::Null),
        ],
    );
    Ok((completed, warnings))
}

/// One row per person: sent/received totals and counts, net transferred.
///
/// Sent and received are tallied independently per user, so a transfer
/// between two known users counts once in each row's `transfer_count` —
/// deliberate per-user tally semantics, not a shared-event count.
pub fn user_transfers(
    transfers: &Table,
    people: &Table,
) -> Result<(Table, Vec<String>), MergeError> {
    require_columns("transfers", transfers, &TRANSFER_COLUMNS)?;

    let sent_spec = GroupSpec {
        group_key: "sender_id".into(),
        outputs: vec![
            ("total_sent".into(), Reduce::sum("amount")),
            ("sent_count".into(), Reduce::distinct_count("transfer_id")),
        ],
    };
    let received_spec = GroupSpec {
        group_key: "recipient_id".into(),
        outputs: vec![
            ("total_received".into(), Reduce::sum("amount")),
            ("received_count".into(), Reduce::distinct_count("transfer_id")),
        ],
    };

    let (sent, mut warnings) = group_by(transfers, &sent_spec)?;
    let (received, w) = group_by(transfers, &received_spec)?;
    warnings.extend(w);

    // Union of every id seen as sender or recipient, before the final
    // per-person completion
    let mut ids: BTreeSet<&Value> = BTreeSet::new();
    for row in sent.rows() {
        ids.insert(&row[0]);
    }
    for row in received.rows() {
        ids.insert(&row[0]);
    }

    let sent_by_id: HashMap<&Value, &Vec<Value>> =
        sent.rows().iter().map(|r| (&r[0], r)).collect();
    let received_by_id: HashMap<&Value, &Vec<Value>> =
        received.rows().iter().map(|r| (&r[0], r)).collect();

    let mut assembled = Table::new([
        "user_id",
        "total_sent",
        "total_received",
        "net_transferred",
        "sent_count",
        "received_count",
        "transfer_count",
    ]);

    for id in ids {
        let (total_sent, sent_count) = match sent_by_id.get(id) {
            Some(row) => (row[1].clone(), row[2].clone()),
            None => (Value::Int(0), Value::Int(0)),
        };
        let (total_received, received_count) = match received_by_id.get(id) {
            Some(row) => (row[1].clone(), row[2].clone()),
            None => (Value::Int(0), Value::Int(0)),
        };

        let net = total_received.as_f64().unwrap_or(0.0) - total_sent.as_f64().unwrap_or(0.0);
        let transfer_count = sent_count.as_f64().unwrap_or(0.0) as i64
            + received_count.as_f64().unwrap_or(0.0) as i64;

        assembled.push_row(vec![
            id.clone(),
            total_sent,
            total_received,
            Value::num(net),
            sent_count,
            received_count,
            Value::Int(transfer_count),
        ]);
    }

    let completed = complete_per_person(
        people,
        &assembled,
        &[
            ("total_sent", Value::Int(0)),
            ("total_received", Value::Int(0)),
            ("net_transferred", Value::Int(0)),
            ("sent_count", Value::Int(0)),
            ("received_count", Value::Int(0)),
            ("transfer_count", Value::Int(0)),
        ],
    );
    Ok((completed, warnings))
}

/// One row per distinct item observed in the transaction set.
pub fn item_summary(transactions: &Table) -> Result<(Table, Vec<String>), MergeError> {
    require_columns("transactions", transactions, &ITEM_COLUMNS)?;

    let spec = GroupSpec {
        group_key: "item".into(),
        outputs: vec![
            ("total_revenue".into(), Reduce::sum("price")),
            ("items_sold".into(), Reduce::sum("quantity")),
            ("transaction_count".into(), Reduce::distinct_count("transaction_id")),
            ("average_price".into(), Reduce::ratio_of("total_revenue", "items_sold")),
        ],
    };
    group_by(transactions, &spec)
}

/// One row per distinct store observed in the transaction set.
pub fn store_summary(transactions: &Table) -> Result<(Table, Vec<String>), MergeError> {
    require_columns("transactions", transactions, &STORE_COLUMNS)?;

    let spec = GroupSpec {
        group_key: "store".into(),
        outputs: vec![
            ("total_revenue".into(), Reduce::sum("price")),
            ("items_sold".into(), Reduce::sum("quantity")),
            ("total_transactions".into(), Reduce::distinct_count("transaction_id")),
            (
                "average_transaction_value".into(),
                Reduce::ratio_of("total_revenue", "total_transactions"),
            ),
            ("most_sold_item".into(), Reduce::arg_max("item", "quantity")),
            ("most_profitable_item".into(), Reduce::arg_max("item", "price")),
        ],
    };
    group_by(transactions, &spec)
}

/// Left-complete a `user_id`-keyed grouped table against the identity table:
/// one output row per person, in identity order, filling absentees from
/// `fills`. Grouped rows whose id is not a known person are dropped.
fn complete_per_person(people: &Table, grouped: &Table, fills: &[(&str, Value)]) -> Table {
    let (Some(people_key), Some(grouped_key)) =
        (people.column_index("user_id"), grouped.column_index("user_id"))
    else {
        return grouped.clone();
    };

    let by_id: HashMap<&Value, &Vec<Value>> = grouped
        .rows()
        .iter()
        .filter(|r| !r[grouped_key].is_null())
        .map(|r| (&r[grouped_key], r))
        .collect();

    let fill_for = |column: &str| {
        fills
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null)
    };

    let mut out = Table::new(grouped.columns().iter().map(String::as_str));
    for person in people.rows() {
        let id = &person[people_key];
        match by_id.get(id) {
            Some(row) => out.push_row((*row).clone()),
            None => {
                let cells = grouped
                    .columns()
                    .iter()
                    .enumerate()
                    .map(|(i, col)| if i == grouped_key { id.clone() } else { fill_for(col) })
                    .collect();
                out.push_row(cells);
            }
        }
    }
    out
}

use rusqlite::Connection;

use super::billing::{refresh_bill, sum_payments};
use super::list_bills;
use crate::db::DatabaseError;
use crate::models::*;

/// A single consistency issue detected by the checker.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConsistencyIssue {
    pub category: String,
    pub severity: String,
    pub description: String,
    pub entity: Option<String>,
}

/// Result of a consistency check across the denormalized columns.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConsistencyReport {
    pub issues: Vec<ConsistencyIssue>,
    pub bills_checked: i64,
    pub appointments_checked: i64,
}

impl ConsistencyReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Run a full consistency check across the database. Read-only.
///
/// Detects:
/// - Bills whose stored paid amount differs from the sum of their payments
/// - Bills whose stored status differs from the one their amounts imply
/// - Appointments ending at or before their start (only possible in
///   databases created without the time-order check)
pub fn check_consistency(conn: &Connection) -> Result<ConsistencyReport, DatabaseError> {
    let mut issues = Vec::new();

    // 1. Paid amount vs payment rows
    let mut stmt = conn.prepare(
        "SELECT b.bill_id, b.paid_cents,
                COALESCE((SELECT SUM(p.amount_cents) FROM payments p WHERE p.bill_id = b.bill_id), 0)
         FROM billing b",
    )?;
    let paid_rows: Vec<(i64, i64, i64)> = stmt
        .query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    drop(stmt);

    for (bill_id, stored, actual) in &paid_rows {
        if stored != actual {
            issues.push(ConsistencyIssue {
                category: "billing_paid_drift".into(),
                severity: "high".into(),
                description: format!(
                    "Bill paid amount {} does not match payments total {}",
                    Money::from_cents(*stored),
                    Money::from_cents(*actual)
                ),
                entity: Some(format!("bill:{bill_id}")),
            });
        }
    }

    // 2. Stored status vs status implied by stored amounts
    for bill in list_bills(conn, &BillingFilter::default())? {
        let derived = bill.derived_status();
        if derived != bill.status {
            issues.push(ConsistencyIssue {
                category: "billing_status_drift".into(),
                severity: "medium".into(),
                description: format!(
                    "Bill status is '{}' but paid {} of {} implies '{}'",
                    bill.status, bill.paid, bill.total, derived
                ),
                entity: Some(format!("bill:{}", bill.id)),
            });
        }
    }

    // 3. Appointment time order
    let mut stmt = conn.prepare(
        "SELECT appointment_id FROM appointments WHERE scheduled_end <= scheduled_start",
    )?;
    let inverted: Vec<i64> = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    drop(stmt);

    for id in inverted {
        issues.push(ConsistencyIssue {
            category: "appointment_time_order".into(),
            severity: "high".into(),
            description: "Appointment ends at or before its start".into(),
            entity: Some(format!("appointment:{id}")),
        });
    }

    let appointments_checked: i64 =
        conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?;

    Ok(ConsistencyReport {
        issues,
        bills_checked: paid_rows.len() as i64,
        appointments_checked,
    })
}

/// Auto-repair billing drift.
///
/// Recomputes every bill's paid amount from its payments and re-derives the
/// status (cancelled bills keep their status). Appointment time-order issues
/// need a human decision and are left alone.
///
/// Returns the number of bills changed.
pub fn repair_consistency(conn: &Connection) -> Result<usize, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let mut repaired = 0;

    for bill in list_bills(&tx, &BillingFilter::default())? {
        let status = refresh_bill(&tx, bill.id)?;
        let paid = sum_payments(&tx, bill.id)?;
        if status != bill.status || paid != bill.paid {
            tracing::info!(
                bill_id = bill.id,
                from = bill.status.as_str(),
                to = status.as_str(),
                paid = %paid,
                "Repaired billing drift"
            );
            repaired += 1;
        }
    }

    tx.commit()?;
    Ok(repaired)
}

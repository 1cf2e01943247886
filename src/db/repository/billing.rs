//! Bills and payments.
//!
//! `billing.paid_cents` and `billing.status` are denormalized: the store does
//! not tie them to the payment rows. Every payment write here recomputes both
//! from `payments` inside the same transaction. `Cancelled` is only set by
//! [`cancel_bill`] and is never overwritten by a recomputation.

use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use super::{format_date, format_datetime, parse_date, parse_datetime};
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const BILL_COLUMNS: &str =
    "bill_id, patient_id, appointment_id, bill_date, total_cents, paid_cents, status";

pub fn insert_bill(conn: &Connection, bill: &NewBill) -> Result<i64, DatabaseError> {
    if bill.total.cents() < 0 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "bill total must not be negative ({})",
            bill.total
        )));
    }
    conn.execute(
        "INSERT INTO billing (patient_id, appointment_id, bill_date, total_cents, paid_cents, status)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![
            bill.patient_id,
            bill.appointment_id,
            format_date(&bill.bill_date),
            bill.total.cents(),
            BillingStatus::derive(bill.total, Money::ZERO).as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_bill(conn: &Connection, id: i64) -> Result<Option<Bill>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {BILL_COLUMNS} FROM billing WHERE bill_id = ?1"),
            params![id],
            bill_row_from_rusqlite,
        )
        .optional()?;
    row.map(bill_from_row).transpose()
}

fn require_bill(conn: &Connection, id: i64) -> Result<Bill, DatabaseError> {
    get_bill(conn, id)?.ok_or_else(|| DatabaseError::not_found("Bill", id))
}

/// Bills matching `filter`, newest first.
pub fn list_bills(conn: &Connection, filter: &BillingFilter) -> Result<Vec<Bill>, DatabaseError> {
    let mut sql = format!("SELECT {BILL_COLUMNS} FROM billing WHERE 1=1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(patient_id) = filter.patient_id {
        params_vec.push(Box::new(patient_id));
        sql.push_str(&format!(" AND patient_id = ?{}", params_vec.len()));
    }
    if let Some(status) = filter.status {
        params_vec.push(Box::new(status.as_str()));
        sql.push_str(&format!(" AND status = ?{}", params_vec.len()));
    }
    sql.push_str(" ORDER BY bill_date DESC, bill_id DESC");

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), bill_row_from_rusqlite)?;

    let mut bills = Vec::new();
    for row in rows {
        bills.push(bill_from_row(row?)?);
    }
    Ok(bills)
}

pub fn outstanding_balance(conn: &Connection, bill_id: i64) -> Result<Money, DatabaseError> {
    Ok(require_bill(conn, bill_id)?.outstanding())
}

/// Record a payment and bring the bill's paid amount and status up to date.
///
/// Rejects non-positive amounts, payments on cancelled bills, and payments
/// larger than the outstanding balance.
pub fn record_payment(conn: &Connection, payment: &NewPayment) -> Result<i64, DatabaseError> {
    if payment.amount.cents() <= 0 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "payment amount must be positive ({})",
            payment.amount
        )));
    }

    let tx = conn.unchecked_transaction()?;

    let bill = require_bill(&tx, payment.bill_id)?;
    if bill.status == BillingStatus::Cancelled {
        return Err(DatabaseError::ConstraintViolation(format!(
            "bill {} is cancelled",
            bill.id
        )));
    }
    let already_paid = sum_payments(&tx, bill.id)?;
    let outstanding = bill.total - already_paid;
    if payment.amount > outstanding {
        return Err(DatabaseError::ConstraintViolation(format!(
            "payment {} exceeds outstanding balance {} on bill {}",
            payment.amount, outstanding, bill.id
        )));
    }

    tx.execute(
        "INSERT INTO payments (bill_id, payment_date, amount_cents, method, reference)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            payment.bill_id,
            format_datetime(&payment.payment_date),
            payment.amount.cents(),
            payment.method.as_str(),
            payment.reference,
        ],
    )?;
    let payment_id = tx.last_insert_rowid();
    let status = refresh_bill(&tx, bill.id)?;
    tx.commit()?;

    tracing::info!(
        bill_id = bill.id,
        payment_id,
        amount = %payment.amount,
        status = status.as_str(),
        "Payment recorded"
    );
    Ok(payment_id)
}

pub fn list_payments(conn: &Connection, bill_id: i64) -> Result<Vec<Payment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT payment_id, bill_id, payment_date, amount_cents, method, reference
         FROM payments WHERE bill_id = ?1
         ORDER BY payment_date ASC, payment_id ASC",
    )?;

    let rows = stmt.query_map(params![bill_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
        ))
    })?;

    let mut payments = Vec::new();
    for row in rows {
        let (id, bill_id, payment_date, amount_cents, method, reference) = row?;
        payments.push(Payment {
            id,
            bill_id,
            payment_date: parse_datetime("payment_date", &payment_date)?,
            amount: Money::from_cents(amount_cents),
            method: PaymentMethod::from_str(&method)?,
            reference,
        });
    }
    Ok(payments)
}

/// Remove a payment (e.g. a reversed card charge) and recompute the bill.
pub fn delete_payment(conn: &Connection, payment_id: i64) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    let bill_id: i64 = tx
        .query_row(
            "SELECT bill_id FROM payments WHERE payment_id = ?1",
            params![payment_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| DatabaseError::not_found("Payment", payment_id))?;

    tx.execute("DELETE FROM payments WHERE payment_id = ?1", params![payment_id])?;
    let status = refresh_bill(&tx, bill_id)?;
    tx.commit()?;

    tracing::info!(bill_id, payment_id, status = status.as_str(), "Payment removed");
    Ok(())
}

/// Mark a bill cancelled. Existing payments are kept.
pub fn cancel_bill(conn: &Connection, bill_id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE billing SET status = ?1 WHERE bill_id = ?2",
        params![BillingStatus::Cancelled.as_str(), bill_id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Bill", bill_id));
    }
    Ok(())
}

/// Removes the bill and all its payments (cascade).
pub fn delete_bill(conn: &Connection, bill_id: i64) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM billing WHERE bill_id = ?1", params![bill_id])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("Bill", bill_id));
    }
    Ok(())
}

pub(crate) fn sum_payments(conn: &Connection, bill_id: i64) -> Result<Money, DatabaseError> {
    let cents: i64 = conn.query_row(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE bill_id = ?1",
        params![bill_id],
        |row| row.get(0),
    )?;
    Ok(Money::from_cents(cents))
}

/// Recompute `paid_cents` from the payment rows and re-derive the status.
/// Returns the status the bill holds afterwards.
pub(crate) fn refresh_bill(conn: &Connection, bill_id: i64) -> Result<BillingStatus, DatabaseError> {
    let bill = require_bill(conn, bill_id)?;
    let paid = sum_payments(conn, bill_id)?;
    let status = match bill.status {
        BillingStatus::Cancelled => BillingStatus::Cancelled,
        _ => BillingStatus::derive(bill.total, paid),
    };

    conn.execute(
        "UPDATE billing SET paid_cents = ?1, status = ?2 WHERE bill_id = ?3",
        params![paid.cents(), status.as_str(), bill_id],
    )?;
    Ok(status)
}

type BillRow = (i64, i64, Option<i64>, String, i64, i64, String);

fn bill_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<BillRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn bill_from_row(row: BillRow) -> Result<Bill, DatabaseError> {
    let (id, patient_id, appointment_id, bill_date, total_cents, paid_cents, status) = row;
    Ok(Bill {
        id,
        patient_id,
        appointment_id,
        bill_date: parse_date("bill_date", &bill_date)?,
        total: Money::from_cents(total_cents),
        paid: Money::from_cents(paid_cents),
        status: BillingStatus::from_str(&status)?,
    })
}

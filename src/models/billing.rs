use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::enums::{BillingStatus, PaymentMethod};
use super::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: i64,
    pub patient_id: i64,
    pub appointment_id: Option<i64>,
    pub bill_date: NaiveDate,
    pub total: Money,
    pub paid: Money,
    pub status: BillingStatus,
}

impl Bill {
    pub fn outstanding(&self) -> Money {
        if self.paid >= self.total {
            Money::ZERO
        } else {
            self.total - self.paid
        }
    }

    /// Status the stored amounts imply. A cancelled bill stays cancelled.
    pub fn derived_status(&self) -> BillingStatus {
        match self.status {
            BillingStatus::Cancelled => BillingStatus::Cancelled,
            _ => BillingStatus::derive(self.total, self.paid),
        }
    }
}

/// A bill to be issued. Starts `Unpaid` with nothing paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBill {
    pub patient_id: i64,
    pub appointment_id: Option<i64>,
    pub bill_date: NaiveDate,
    pub total: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub bill_id: i64,
    pub payment_date: NaiveDateTime,
    pub amount: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub bill_id: i64,
    pub payment_date: NaiveDateTime,
    pub amount: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

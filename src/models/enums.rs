use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

use super::Money;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Gender {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

str_enum!(AppointmentStatus {
    Scheduled => "Scheduled",
    CheckedIn => "CheckedIn",
    Completed => "Completed",
    Cancelled => "Cancelled",
    NoShow => "NoShow",
});

str_enum!(BillingStatus {
    Unpaid => "Unpaid",
    PartiallyPaid => "PartiallyPaid",
    Paid => "Paid",
    Cancelled => "Cancelled",
});

str_enum!(PaymentMethod {
    Cash => "Cash",
    Card => "Card",
    MobileMoney => "MobileMoney",
    Insurance => "Insurance",
});

impl BillingStatus {
    /// Status implied by the amount paid against the bill total.
    /// A bill is settled once paid reaches the total, so a zero-total bill
    /// is `Paid` from the start. Never yields `Cancelled`, which is set
    /// explicitly.
    pub fn derive(total: Money, paid: Money) -> Self {
        if paid >= total {
            Self::Paid
        } else if paid.cents() <= 0 {
            Self::Unpaid
        } else {
            Self::PartiallyPaid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn joined<T: std::fmt::Display>(all: &[T]) -> String {
        all.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
    }

    #[test]
    fn stored_names_match_schema_domains() {
        assert_eq!(joined(Gender::ALL), "Male,Female,Other");
        assert_eq!(
            joined(AppointmentStatus::ALL),
            "Scheduled,CheckedIn,Completed,Cancelled,NoShow"
        );
        assert_eq!(joined(BillingStatus::ALL), "Unpaid,PartiallyPaid,Paid,Cancelled");
        assert_eq!(joined(PaymentMethod::ALL), "Cash,Card,MobileMoney,Insurance");
    }

    #[test]
    fn parse_uses_stored_names() {
        assert_eq!(AppointmentStatus::from_str("NoShow").unwrap(), AppointmentStatus::NoShow);
        assert_eq!(PaymentMethod::from_str("MobileMoney").unwrap(), PaymentMethod::MobileMoney);
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(Gender::from_str("male").is_err());
        assert!(AppointmentStatus::from_str("Checked In").is_err());
        assert!(BillingStatus::from_str("").is_err());
        match PaymentMethod::from_str("Cheque") {
            Err(DatabaseError::InvalidEnum { field, value }) => {
                assert_eq!(field, "PaymentMethod");
                assert_eq!(value, "Cheque");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn billing_status_derivation() {
        let total = Money::from_cents(150_000);
        assert_eq!(BillingStatus::derive(total, Money::ZERO), BillingStatus::Unpaid);
        assert_eq!(
            BillingStatus::derive(total, Money::from_cents(50_000)),
            BillingStatus::PartiallyPaid
        );
        assert_eq!(BillingStatus::derive(total, total), BillingStatus::Paid);
    }

    #[test]
    fn zero_total_bill_is_settled() {
        assert_eq!(BillingStatus::derive(Money::ZERO, Money::ZERO), BillingStatus::Paid);
    }
}

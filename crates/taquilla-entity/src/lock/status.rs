//! Lock status and lock type enumerations.
//!
//! The status vocabulary is the box-office domain language and is stored
//! verbatim in the database (`lock_status` enum type).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a seat lock.
///
/// `available` and `expired` are implicit: absence of a row, and presence
/// of a row whose `expires_at` has passed. Readers treat both as free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lock_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LockStatus {
    /// Buyer is browsing with this seat in their cart. Short TTL.
    Seleccionado,
    /// Payment initiated; checkout hold with a longer TTL.
    Reservado,
    /// Sale final, payment settled.
    Pagado,
    /// Sale final, recorded through a box-office channel.
    Vendido,
    /// Administrative hold placed from the backoffice.
    Bloqueado,
    /// Administrative hold placed through the legacy map editor.
    Locked,
}

impl LockStatus {
    /// Whether this status is in the permanent set: a non-expired lock with
    /// this status refuses buyer-initiated unlocks and cannot be taken over.
    pub fn is_permanent(&self) -> bool {
        !matches!(self, Self::Seleccionado)
    }

    /// Whether this status represents a finalized sale. Terminal: no
    /// buyer-facing transition leaves it.
    pub fn is_terminal_sale(&self) -> bool {
        matches!(self, Self::Pagado | Self::Vendido)
    }

    /// Whether this status is an administrative hold.
    pub fn is_administrative(&self) -> bool {
        matches!(self, Self::Bloqueado | Self::Locked)
    }

    /// Return the status as its stored lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seleccionado => "seleccionado",
            Self::Reservado => "reservado",
            Self::Pagado => "pagado",
            Self::Vendido => "vendido",
            Self::Bloqueado => "bloqueado",
            Self::Locked => "locked",
        }
    }

    /// Whether a lock owned by the same session may move from `self` to
    /// `next` via a re-lock. Terminal and administrative rows never move;
    /// a checkout hold may only renew or finalize.
    pub fn allows_transition_to(&self, next: LockStatus) -> bool {
        match self {
            Self::Seleccionado => true,
            Self::Reservado => matches!(next, Self::Reservado | Self::Pagado | Self::Vendido),
            Self::Pagado | Self::Vendido | Self::Bloqueado | Self::Locked => false,
        }
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Granularity of a reservation lock. Only `seat` is in active use; the
/// other variants reserve room for table and zone holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lock_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LockType {
    /// A single seat.
    Seat,
    /// A whole table.
    Table,
    /// A whole zone.
    Zone,
}

impl LockType {
    /// Return the type as its stored lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seat => "seat",
            Self::Table => "table",
            Self::Zone => "zone",
        }
    }
}

impl fmt::Display for LockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

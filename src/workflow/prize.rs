use crate::models::{PrizeStatus, RoleSet};
use super::StatusOption;

pub const PERMISSION_DENIED_LABEL: &str = "You do not have permission to change the prize status";
pub const UNKNOWN_STATUS_LABEL: &str = "Unknown status";

/// Returns the single next status for a prize and the action label for it.
///
/// Admins follow the fixed cycle Available -> PendingRedemption -> Redeemed
/// -> Available. Everyone else gets the current status back with a
/// permission-denied label.
pub fn next_prize_status(current: PrizeStatus, roles: &RoleSet) -> StatusOption<PrizeStatus> {
    if !roles.is_admin() {
        return StatusOption::new(PERMISSION_DENIED_LABEL, current);
    }

    match current {
        PrizeStatus::Available => StatusOption::new("Request Prize", PrizeStatus::PendingRedemption),
        PrizeStatus::PendingRedemption => StatusOption::new("Redeem Prize", PrizeStatus::Redeemed),
        PrizeStatus::Redeemed => StatusOption::new("Make Prize Available", PrizeStatus::Available),
    }
}

/// Advisory result for a status read straight from storage.
///
/// Unrecognized values can only show up here; admins get the
/// "Unknown status" label with the raw value unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPrizeAdvice {
    Known(StatusOption<PrizeStatus>),
    Unknown { label: &'static str, status: String },
}

impl RawPrizeAdvice {
    pub fn label(&self) -> &'static str {
        match self {
            RawPrizeAdvice::Known(option) => option.label,
            RawPrizeAdvice::Unknown { label, .. } => *label,
        }
    }

    /// Next status as a stored string
    pub fn status_str(&self) -> &str {
        match self {
            RawPrizeAdvice::Known(option) => option.status.as_str(),
            RawPrizeAdvice::Unknown { status, .. } => status,
        }
    }
}

pub fn next_prize_status_for_raw(raw: &str, roles: &RoleSet) -> RawPrizeAdvice {
    match PrizeStatus::from_str(raw) {
        Some(status) => RawPrizeAdvice::Known(next_prize_status(status, roles)),
        None if roles.is_admin() => RawPrizeAdvice::Unknown {
            label: UNKNOWN_STATUS_LABEL,
            status: raw.to_string(),
        },
        None => RawPrizeAdvice::Unknown {
            label: PERMISSION_DENIED_LABEL,
            status: raw.to_string(),
        },
    }
}

/// True when the advisory result moves the prize somewhere new
pub fn is_prize_change(current: PrizeStatus, advice: &StatusOption<PrizeStatus>) -> bool {
    advice.status != current
}

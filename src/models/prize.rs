use serde::{Deserialize, Serialize};

/// Prize status. Cycles Available -> PendingRedemption -> Redeemed -> Available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrizeStatus {
    Available,
    PendingRedemption,
    Redeemed,
}

impl PrizeStatus {
    pub const ALL: [PrizeStatus; 3] = [
        PrizeStatus::Available,
        PrizeStatus::PendingRedemption,
        PrizeStatus::Redeemed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrizeStatus::Available => "available",
            PrizeStatus::PendingRedemption => "pending_redemption",
            PrizeStatus::Redeemed => "redeemed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(PrizeStatus::Available),
            "pending_redemption" => Some(PrizeStatus::PendingRedemption),
            "redeemed" => Some(PrizeStatus::Redeemed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrizeStatus::Available => "Available",
            PrizeStatus::PendingRedemption => "Pending Redemption",
            PrizeStatus::Redeemed => "Redeemed",
        }
    }
}

/// Prize model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prize {
    pub id: Option<i64>,
    pub uuid: String,
    pub department_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub cost: i64,
    pub status: PrizeStatus,
    pub requested_by: Option<i64>,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl Prize {
    pub fn new(department_id: i64, name: String, cost: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            uuid: uuid::Uuid::new_v4().to_string(),
            department_id,
            name,
            description: None,
            cost,
            status: PrizeStatus::Available,
            requested_by: None,
            created_ts: now,
            modified_ts: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prize_status_conversion() {
        for status in PrizeStatus::ALL {
            assert_eq!(PrizeStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(PrizeStatus::from_str("claimed"), None);
    }

    #[test]
    fn test_prize_creation() {
        let prize = Prize::new(2, "Gift card".to_string(), 50);
        assert_eq!(prize.status, PrizeStatus::Available);
        assert_eq!(prize.cost, 50);
        assert!(prize.requested_by.is_none());
    }
}

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Trainer profile joined with the owning user's name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TrainerProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub experience_years: i32,
    pub hourly_rate: Decimal,
    pub bio: String,
    pub is_available: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TrainerProfile {
    /// "John Doe - Strength & Conditioning"
    pub fn display_name(&self) -> String {
        format!("{} {} - {}", self.first_name, self.last_name, self.specialization)
    }
}

#[derive(Debug, Clone)]
pub struct NewTrainerProfile {
    pub user_id: Uuid,
    pub specialization: String,
    pub experience_years: i32,
    pub hourly_rate: Decimal,
    pub bio: String,
    pub is_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_combines_name_and_specialization() {
        let now = OffsetDateTime::now_utc();
        let t = TrainerProfile {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            first_name: "Jane".into(),
            last_name: "Roe".into(),
            specialization: "Mobility".into(),
            experience_years: 6,
            hourly_rate: Decimal::new(4500, 2),
            bio: String::new(),
            is_available: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(t.display_name(), "Jane Roe - Mobility");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["hourly_rate"], "45.00");
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A whole date closed for walks, either for every dog (`dog_id == None`) or one dog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedDate {
    pub id: i64,
    pub date: NaiveDate,
    pub dog_id: Option<i64>,
    pub reason: String,
    pub created_by: i64,
}

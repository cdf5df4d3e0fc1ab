use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A registered badge holder.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Subject {
    pub id: u64,
    #[schema(example = "04A1B2C3", value_type = String)]
    pub card_token: String,
    #[schema(example = "John Doe", value_type = String)]
    pub display_name: String,
}

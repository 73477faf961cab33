//! Uploaded file attachment entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub file_name: String,

    /// Path under the configured upload directory
    #[sea_orm(column_type = "Text")]
    pub stored_path: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub content_type: Option<String>,

    pub size_bytes: i64,

    pub store_id: Option<Uuid>,

    /// Email of the uploader; null for anonymous QR-scoped uploads
    #[sea_orm(column_type = "Text", nullable)]
    pub uploaded_by: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
}

impl ActiveModelBehavior for ActiveModel {}

//! Backing table of [`SqlStore`](super::SqlStore): one row per document.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    /// Insertion order; natural order of a collection scan.
    #[sea_orm(primary_key)]
    pub seq: i32,
    pub collection: String,
    pub doc_id: String,
    /// JSON object.
    pub body: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

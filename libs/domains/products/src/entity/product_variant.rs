use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_variants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub stock: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub price_override: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::ProductVariant {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            sku: model.sku,
            color: model.color,
            size: model.size,
            stock: model.stock,
            price_override: model.price_override,
        }
    }
}

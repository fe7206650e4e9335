use sea_orm::sea_query::{ExprTrait, Func, LikeExpr, Query, SelectStatement};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, Select, prelude::Expr,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entity::{brand, category, product, product_image, product_variant};
use crate::error::{ProductError, ProductResult};
use crate::models::{
    Brand, BrandDetail, Category, CategoryDetail, CategoryRef, Pagination, ProductDetail,
    ProductPage, ProductRef, ProductSummary,
};
use crate::projection;
use crate::query::{CategoryFilter, ProductQuery, Sort, SortField, SortOrder, contains_pattern};

pub(super) async fn detail_of<C: ConnectionTrait>(
    conn: &C,
    product: product::Model,
) -> ProductResult<ProductDetail> {
    let brand = match product.brand_id {
        Some(id) => brand::Entity::find_by_id(id).one(conn).await?,
        None => None,
    };
    let category = match product.category_id {
        Some(id) => category::Entity::find_by_id(id).one(conn).await?,
        None => None,
    };
    let variants = product_variant::Entity::find()
        .filter(product_variant::Column::ProductId.eq(product.id))
        .all(conn)
        .await?;
    let images = product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(product.id))
        .all(conn)
        .await?;

    Ok(projection::detail(
        product,
        brand.as_ref(),
        category.as_ref(),
        variants,
        images,
    ))
}

pub(super) async fn product_detail<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> ProductResult<Option<ProductDetail>> {
    match product::Entity::find_by_id(id).one(conn).await? {
        Some(model) => Ok(Some(detail_of(conn, model).await?)),
        None => Ok(None),
    }
}

/// `lower(column) LIKE %term%` with metacharacters in `term` escaped
fn contains_ignore_case(column: product::Column, term: &str) -> Expr {
    Expr::expr(Func::lower(Expr::col(column)))
        .like(LikeExpr::new(contains_pattern(term)).escape('\\'))
}

/// Ids of products with at least one variant in stock. Stock is never
/// negative, so this equals "variant stock sums above zero".
fn stocked_products() -> SelectStatement {
    Query::select()
        .column(product_variant::Column::ProductId)
        .from(product_variant::Entity)
        .and_where(Expr::col(product_variant::Column::Stock).gt(0))
        .to_owned()
}

fn sorted(select: Select<product::Entity>, sort: Sort) -> Select<product::Entity> {
    let column = match sort.field {
        SortField::CreatedAt => product::Column::CreatedAt,
        SortField::UpdatedAt => product::Column::UpdatedAt,
        SortField::Price => product::Column::Price,
        SortField::Name => product::Column::Name,
    };
    let order = match sort.order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };
    select
        .order_by(column, order)
        .order_by_asc(product::Column::Id)
}

pub(super) async fn list_products<C: ConnectionTrait>(
    conn: &C,
    query: &ProductQuery,
) -> ProductResult<ProductPage> {
    let filter = &query.filter;

    let category_id = match &filter.category {
        None => None,
        Some(CategoryFilter::Id(id)) => Some(*id),
        Some(CategoryFilter::Slug(slug)) => Some(
            category::Entity::find()
                .filter(category::Column::Slug.eq(slug.as_str()))
                .one(conn)
                .await?
                .ok_or_else(|| ProductError::not_found("Category", slug))?
                .id,
        ),
    };

    let select = product::Entity::find()
        .apply_if(category_id, |q, id| q.filter(product::Column::CategoryId.eq(id)))
        .apply_if(filter.brand_id, |q, id| q.filter(product::Column::BrandId.eq(id)))
        .apply_if(filter.min_price, |q, min| q.filter(product::Column::Price.gte(min)))
        .apply_if(filter.max_price, |q, max| q.filter(product::Column::Price.lte(max)))
        .apply_if(query.search_term(), |q, term| {
            q.filter(
                Condition::any()
                    .add(contains_ignore_case(product::Column::Name, term))
                    .add(contains_ignore_case(product::Column::Description, term)),
            )
        })
        .apply_if(filter.in_stock.then_some(()), |q, ()| {
            q.filter(product::Column::Id.in_subquery(stocked_products()))
        });

    let total = select.clone().count(conn).await?;
    let rows = sorted(select, query.sort)
        .offset(query.offset())
        .limit(query.per_page)
        .all(conn)
        .await?;

    let data = summaries(conn, rows).await?;
    Ok(ProductPage::new(
        data,
        Pagination::new(total, query.page, query.per_page),
    ))
}

/// Summaries for one page of products, keeping their order.
async fn summaries<C: ConnectionTrait>(
    conn: &C,
    products: Vec<product::Model>,
) -> ProductResult<Vec<ProductSummary>> {
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let brand_ids: Vec<Uuid> = products.iter().filter_map(|p| p.brand_id).collect();
    let category_ids: Vec<Uuid> = products.iter().filter_map(|p| p.category_id).collect();

    let brands: HashMap<Uuid, brand::Model> = brand::Entity::find()
        .filter(brand::Column::Id.is_in(brand_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();
    let categories: HashMap<Uuid, category::Model> = category::Entity::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut stock: HashMap<Uuid, (i64, usize)> = HashMap::new();
    for variant in product_variant::Entity::find()
        .filter(product_variant::Column::ProductId.is_in(ids))
        .all(conn)
        .await?
    {
        let entry = stock.entry(variant.product_id).or_default();
        entry.0 += i64::from(variant.stock);
        entry.1 += 1;
    }

    Ok(products
        .iter()
        .map(|p| {
            let (total_stock, variant_count) = stock.get(&p.id).copied().unwrap_or_default();
            projection::summary(
                p,
                p.brand_id.and_then(|id| brands.get(&id)),
                p.category_id.and_then(|id| categories.get(&id)),
                total_stock,
                variant_count,
            )
        })
        .collect())
}

async fn product_refs<C: ConnectionTrait>(
    conn: &C,
    condition: Condition,
) -> ProductResult<Vec<ProductRef>> {
    let products = product::Entity::find()
        .filter(condition)
        .order_by_asc(product::Column::Name)
        .order_by_asc(product::Column::Id)
        .all(conn)
        .await?;
    Ok(products.iter().map(ProductRef::from).collect())
}

pub(super) async fn brand_detail<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> ProductResult<Option<BrandDetail>> {
    let Some(brand) = brand::Entity::find_by_id(id).one(conn).await? else {
        return Ok(None);
    };
    let products = product_refs(conn, Condition::all().add(product::Column::BrandId.eq(id))).await?;

    Ok(Some(BrandDetail {
        id: brand.id,
        name: brand.name,
        description: brand.description,
        products,
        created_at: brand.created_at.into(),
        updated_at: brand.updated_at.into(),
    }))
}

pub(super) async fn category_detail<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> ProductResult<Option<CategoryDetail>> {
    let Some(category) = category::Entity::find_by_id(id).one(conn).await? else {
        return Ok(None);
    };

    let parent = match category.parent_id {
        Some(parent_id) => category::Entity::find_by_id(parent_id).one(conn).await?,
        None => None,
    };
    let children = category::Entity::find()
        .filter(category::Column::ParentId.eq(id))
        .order_by_asc(category::Column::Name)
        .order_by_asc(category::Column::Id)
        .all(conn)
        .await?;
    let products =
        product_refs(conn, Condition::all().add(product::Column::CategoryId.eq(id))).await?;

    Ok(Some(CategoryDetail {
        id: category.id,
        name: category.name,
        slug: category.slug,
        parent: parent.as_ref().map(CategoryRef::from),
        children: children.iter().map(CategoryRef::from).collect(),
        products,
        created_at: category.created_at.into(),
        updated_at: category.updated_at.into(),
    }))
}

pub(super) async fn list_brands<C: ConnectionTrait>(conn: &C) -> ProductResult<Vec<Brand>> {
    let brands = brand::Entity::find()
        .order_by_asc(brand::Column::Name)
        .order_by_asc(brand::Column::Id)
        .all(conn)
        .await?;
    Ok(brands.into_iter().map(Brand::from).collect())
}

pub(super) async fn list_categories<C: ConnectionTrait>(conn: &C) -> ProductResult<Vec<Category>> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .order_by_asc(category::Column::Id)
        .all(conn)
        .await?;
    Ok(categories.into_iter().map(Category::from).collect())
}

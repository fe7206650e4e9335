//! Builds response projections from stored rows.

use crate::entity::{brand, category, product, product_image, product_variant};
use crate::models::{BrandRef, CategoryRef, ProductDetail, ProductSummary};

pub(crate) fn brand_ref(brand: &brand::Model) -> BrandRef {
    BrandRef {
        id: brand.id,
        name: brand.name.clone(),
    }
}

pub(crate) fn summary(
    product: &product::Model,
    brand: Option<&brand::Model>,
    category: Option<&category::Model>,
    total_stock: i64,
    variant_count: usize,
) -> ProductSummary {
    ProductSummary {
        id: product.id,
        name: product.name.clone(),
        slug: product.slug.clone(),
        description: product.description.clone(),
        price: product.price,
        brand: brand.map(brand_ref),
        category: category.map(CategoryRef::from),
        total_stock,
        variant_count,
        created_at: product.created_at.into(),
        updated_at: product.updated_at.into(),
    }
}

pub(crate) fn detail(
    product: product::Model,
    brand: Option<&brand::Model>,
    category: Option<&category::Model>,
    mut variants: Vec<product_variant::Model>,
    mut images: Vec<product_image::Model>,
) -> ProductDetail {
    variants.sort_by(|a, b| a.sku.cmp(&b.sku).then(a.id.cmp(&b.id)));
    images.sort_by_key(|image| image.id);

    let total_stock = variants.iter().map(|v| i64::from(v.stock)).sum();

    ProductDetail {
        id: product.id,
        name: product.name,
        slug: product.slug,
        description: product.description,
        price: product.price,
        brand: brand.map(brand_ref),
        category: category.map(CategoryRef::from),
        total_stock,
        variant_count: variants.len(),
        variants: variants.into_iter().map(Into::into).collect(),
        images: images.into_iter().map(Into::into).collect(),
        created_at: product.created_at.into(),
        updated_at: product.updated_at.into(),
    }
}

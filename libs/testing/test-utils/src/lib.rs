//! Test support for the catalog crates.
//!
//! - [`TestDatabase`]: throwaway PostgreSQL with migrations applied (feature `postgres`)
//! - [`TestDataBuilder`]: per-test names, slugs and SKUs that never collide
//! - [`assertions`]: ordering and presence checks with readable failures
//!
//! ```rust,no_run
//! use test_utils::{TestDataBuilder, TestDatabase};
//!
//! #[tokio::test]
//! async fn creates_a_runner() {
//!     let db = TestDatabase::new().await;
//!     let data = TestDataBuilder::from_test_name("creates_a_runner");
//!
//!     let slug = data.slug("trail-runner");
//!     let sku = data.sku("TR", 1);
//! }
//! ```

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Catalog values tagged with a short per-test suffix.
///
/// Product and category names, slugs and SKUs are unique catalog-wide; deriving
/// them from the test name keeps tests that share a database apart while
/// staying reproducible between runs.
#[derive(Debug, Clone)]
pub struct TestDataBuilder {
    tag: String,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            tag: format!("{:08x}", seed as u32),
        }
    }

    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let a = TestDataBuilder::from_test_name("test_create_product");
    /// let b = TestDataBuilder::from_test_name("test_create_product");
    /// assert_eq!(a.slug("tote"), b.slug("tote"));
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::hash::{BuildHasher, BuildHasherDefault, DefaultHasher};

        Self::new(BuildHasherDefault::<DefaultHasher>::default().hash_one(name))
    }

    /// e.g. `"Trail Runner 1a2b3c4d"`
    pub fn name(&self, base: &str) -> String {
        format!("{base} {}", self.tag)
    }

    /// e.g. `"trail-runner-1a2b3c4d"`; a valid slug whenever `base` is one
    pub fn slug(&self, base: &str) -> String {
        format!("{base}-{}", self.tag)
    }

    /// e.g. `"TR-1a2b3c4d-001"`
    pub fn sku(&self, prefix: &str, n: u32) -> String {
        format!("{prefix}-{}-{n:03}", self.tag)
    }
}

pub mod assertions {
    use std::fmt::Debug;

    /// Unwrap `value`, failing with `context` when it is `None`.
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        match value {
            Some(inner) => inner,
            None => panic!("{context}: expected a value, found None"),
        }
    }

    /// Assert `items` never decrease by `key`. Equal keys are allowed.
    pub fn assert_sorted_by<T, K, F>(items: &[T], key: F, context: &str)
    where
        K: PartialOrd + Debug,
        F: Fn(&T) -> K,
    {
        for (index, pair) in items.windows(2).enumerate() {
            let (a, b) = (key(&pair[0]), key(&pair[1]));
            assert!(
                a <= b,
                "{context}: item {index} ({a:?}) sorts after item {} ({b:?})",
                index + 1
            );
        }
    }
}

//! Literal-or-callable option values

use crate::page::{Page, PageError, PageResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;

/// An option value that is either given directly or produced on demand
///
/// Every predicate, hook and scraper of a suite is a `LazyValue`, and all of
/// them are resolved the same way through [`LazyValue::resolve`].
pub enum LazyValue<T> {
    /// A literal value
    Value(T),

    /// An expression evaluated inside the page; the result is decoded into `T`
    Expr(String),

    /// A native zero-argument function
    Func(Arc<dyn Fn() -> T + Send + Sync>),
}

impl<T> LazyValue<T> {
    /// Wraps a native function
    pub fn func<F>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::Func(Arc::new(f))
    }

    /// Wraps a page expression
    pub fn expr(expr: impl Into<String>) -> Self {
        Self::Expr(expr.into())
    }
}

impl<T> LazyValue<T>
where
    T: Clone + DeserializeOwned,
{
    /// Produces the value, evaluating against `page` when needed
    pub async fn resolve(&self, page: &mut dyn Page) -> PageResult<T> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Func(f) => Ok(f()),
            Self::Expr(expr) => {
                let raw = page.evaluate(expr).await?;
                serde_json::from_value(raw).map_err(|source| PageError::Decode {
                    expr: expr.clone(),
                    source,
                })
            }
        }
    }
}

impl<T: Clone> Clone for LazyValue<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(value) => Self::Value(value.clone()),
            Self::Expr(expr) => Self::Expr(expr.clone()),
            Self::Func(f) => Self::Func(Arc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for LazyValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Expr(expr) => f.debug_tuple("Expr").field(expr).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl<T> From<T> for LazyValue<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

/// Strings deserialize as expressions; anything else as a literal `T`
impl<'de, T> Deserialize<'de> for LazyValue<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<U> {
            Expr(String),
            Value(U),
        }

        Ok(match Raw::<T>::deserialize(deserializer)? {
            Raw::Expr(expr) => Self::Expr(expr),
            Raw::Value(value) => Self::Value(value),
        })
    }
}

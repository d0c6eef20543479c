//! Model declarations: table/primary-key metadata, defaults and hooks.
//!
//! A model is a marker type. Its columns are not declared in Rust; they are
//! discovered from the live table once, by [`crate::register`]. The model only
//! says *which* table, which column is the primary key, and what defaults to
//! fill in on insert.
//!
//! # Example
//!
//! ```ignore
//! use tinyorm::{Defaults, Model, ModelHooks, Value};
//!
//! struct User;
//!
//! impl ModelHooks for User {}
//!
//! impl Model for User {
//!     fn defaults() -> Defaults {
//!         Defaults::new().value("name", "John Doe")
//!     }
//! }
//!
//! tinyorm::register::<User>(db.clone())?;
//! let john = User::get(1)?;
//! ```

use crate::error::{OrmError, OrmResult};
use crate::query::Query;
use crate::record::Record;
use crate::schema::{self, ModelMeta};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Translate a type name into a table name: `MyModel` -> `my_model`.
///
/// Every uppercase letter after the first starts a new word, so acronyms are
/// split letter by letter: `HTTPServer` -> `h_t_t_p_server`.
pub fn default_table_name(type_name: &str) -> String {
    let mut out = String::with_capacity(type_name.len() + 4);
    for (i, ch) in type_name.chars().enumerate() {
        if i > 0 && ch.is_uppercase() {
            out.push('_');
        }
        out.extend(ch.to_lowercase());
    }
    out
}

/// Last path segment of a type name, without generic arguments.
pub(crate) fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Default for a single field, resolved at insert time.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed value.
    Const(Value),
    /// Called once per insert that needs the default.
    Generator(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Produce the value to assign.
    pub fn resolve(&self) -> Value {
        match self {
            Self::Const(v) => v.clone(),
            Self::Generator(f) => f(),
        }
    }

    /// A `Const(Null)` default never changes anything.
    pub(crate) fn is_noop(&self) -> bool {
        matches!(self, Self::Const(Value::Null))
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(v) => f.debug_tuple("Const").field(v).finish(),
            Self::Generator(_) => f.debug_tuple("Generator").field(&"<fn>").finish(),
        }
    }
}

/// Per-model default values, keyed by field name.
///
/// Entries whose name is not a column of the table are ignored at registration.
#[derive(Debug, Clone, Default)]
pub struct Defaults {
    entries: Vec<(String, DefaultValue)>,
}

impl Defaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constant default for `field`.
    pub fn value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field.into(), DefaultValue::Const(value.into()));
        self
    }

    /// Generated default for `field`; `f` runs each time the default is needed.
    pub fn generator<F>(mut self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.insert(field.into(), DefaultValue::Generator(Arc::new(f)));
        self
    }

    pub fn get(&self, field: &str) -> Option<&DefaultValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, d)| d)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, field: String, default: DefaultValue) {
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = default,
            None => self.entries.push((field, default)),
        }
    }
}

/// Lifecycle hooks, invoked around UPDATE and DELETE.
///
/// All hooks default to no-ops. Returning an error aborts the operation.
pub trait ModelHooks: Sized {
    fn before_update(_record: &mut Record<Self>) -> OrmResult<()> {
        Ok(())
    }

    fn after_update(_record: &mut Record<Self>) -> OrmResult<()> {
        Ok(())
    }

    fn before_delete(_record: &mut Record<Self>) -> OrmResult<()> {
        Ok(())
    }

    fn after_delete(_record: &mut Record<Self>) -> OrmResult<()> {
        Ok(())
    }
}

/// A table-backed record type.
///
/// Usually derived with `#[derive(Model)]`; every item has a default.
pub trait Model: ModelHooks + Send + Sync + 'static {
    /// Explicit table name. `None` derives it from the type name.
    const TABLE: Option<&'static str> = None;

    /// Primary key column.
    const PRIMARY_KEY: &'static str = "id";

    /// Field defaults applied before INSERT.
    fn defaults() -> Defaults {
        Defaults::new()
    }

    /// The table this model maps to.
    fn table_name() -> String {
        match Self::TABLE {
            Some(table) => table.to_string(),
            None => default_table_name(short_type_name(std::any::type_name::<Self>())),
        }
    }

    /// Registered metadata for this model.
    fn meta() -> OrmResult<Arc<ModelMeta>> {
        schema::lookup::<Self>()
    }

    /// An unfiltered query over the whole table.
    fn query() -> OrmResult<Query<Self>> {
        Ok(Query::new(Self::meta()?))
    }

    /// Query with keyword-style equality filters (`Null` becomes `IS NULL`).
    fn filter<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> OrmResult<Query<Self>>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        Ok(Self::query()?.filter(pairs))
    }

    /// Query with a literal WHERE fragment and its positional parameters.
    fn where_raw(
        fragment: impl Into<String>,
        params: impl IntoIterator<Item = Value>,
    ) -> OrmResult<Query<Self>> {
        Ok(Self::query()?.where_raw(fragment, params))
    }

    /// Fetch the record whose primary key equals `pk`.
    ///
    /// A `Null` key returns `None` without querying.
    fn get(pk: impl Into<Value>) -> OrmResult<Option<Record<Self>>> {
        let pk = pk.into();
        if pk.is_null() {
            return Ok(None);
        }
        let meta = Self::meta()?;
        let key = meta.primary_key().to_string();
        let mut found = Query::new(meta).where_eq(&key, pk).slice(..1)?;
        Ok(found.pop())
    }

    /// Fetch the first record matching all `filters`.
    ///
    /// Empty filters return `None` without querying.
    fn find_by<K, V>(filters: impl IntoIterator<Item = (K, V)>) -> OrmResult<Option<Record<Self>>>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut filters = filters.into_iter().peekable();
        if filters.peek().is_none() {
            return Ok(None);
        }
        let mut found = Self::query()?.filter(filters).slice(..1)?;
        Ok(found.pop())
    }

    /// A new record with every field unset.
    fn new_record() -> OrmResult<Record<Self>> {
        Ok(Record::new(Self::meta()?))
    }

    /// A new record from positional values in column order.
    fn from_values(values: impl IntoIterator<Item = Value>) -> OrmResult<Record<Self>> {
        Record::construct(Self::meta()?, values, Vec::<(&str, Value)>::new())
    }

    /// A new record from named values.
    fn from_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> OrmResult<Record<Self>>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        Record::construct(Self::meta()?, Vec::new(), fields)
    }

    /// A new record from positional values, then named values for the remaining fields.
    fn construct<K, V>(
        values: impl IntoIterator<Item = Value>,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> OrmResult<Record<Self>>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        Record::construct(Self::meta()?, values, fields)
    }

    /// Rebuild a persisted record from a [`Record::snapshot`].
    fn restore(values: impl IntoIterator<Item = Value>) -> OrmResult<Record<Self>> {
        let mut record = Self::from_values(values)?;
        record.mark_persisted();
        Ok(record)
    }
}

pub(crate) fn require_field(meta: &ModelMeta, field: &str) -> OrmResult<usize> {
    meta.field_index(field)
        .ok_or_else(|| OrmError::unknown_field(meta.table(), field))
}

//! Records: one row of a model, with dirty tracking.
//!
//! A [`Record`] holds the row values in table-column order, whether it has been
//! persisted yet, and which fields were assigned since the last save.
//! [`Record::save`] turns that into an INSERT for new records or a partial
//! UPDATE naming only the changed columns.
//!
//! The primary key is tracked separately: the value loaded (or last saved) is
//! what UPDATE and DELETE target, so assigning a new key and saving moves the
//! row instead of touching a different one.

use crate::error::OrmResult;
use crate::exec;
use crate::ident::{ident_list, quote_ident};
use crate::model::{Model, require_field};
use crate::schema::ModelMeta;
use crate::value::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// One row of model `M`.
pub struct Record<M> {
    meta: Arc<ModelMeta>,
    values: Vec<Value>,
    is_new: bool,
    pk_value: Value,
    changed: BTreeSet<usize>,
    _model: PhantomData<fn() -> M>,
}

impl<M> Record<M> {
    /// A new, unsaved record with every field `Null`.
    pub fn new(meta: Arc<ModelMeta>) -> Self {
        let values = vec![Value::Null; meta.fields().len()];
        Self::assemble(meta, values, true)
    }

    /// A new, unsaved record.
    ///
    /// `values` fill fields in column order (extras are ignored). `fields` then
    /// set fields by name, but only those not already covered positionally.
    /// An unknown name is an error.
    pub fn construct<K, V>(
        meta: Arc<ModelMeta>,
        values: impl IntoIterator<Item = Value>,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> OrmResult<Self>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut slots = vec![Value::Null; meta.fields().len()];
        let mut covered = 0;
        for (slot, value) in slots.iter_mut().zip(values) {
            *slot = value;
            covered += 1;
        }
        for (name, value) in fields {
            let index = require_field(&meta, name.as_ref())?;
            if index >= covered {
                slots[index] = value.into();
            }
        }
        Ok(Self::assemble(meta, slots, true))
    }

    /// A persisted record built from a result row.
    pub(crate) fn from_row(meta: Arc<ModelMeta>, mut row: Vec<Value>) -> Self {
        row.resize(meta.fields().len(), Value::Null);
        Self::assemble(meta, row, false)
    }

    fn assemble(meta: Arc<ModelMeta>, values: Vec<Value>, is_new: bool) -> Self {
        let pk_value = values[meta.pk_index()].clone();
        Self {
            meta,
            values,
            is_new,
            pk_value,
            changed: BTreeSet::new(),
            _model: PhantomData,
        }
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.is_new = false;
    }

    pub fn meta(&self) -> &Arc<ModelMeta> {
        &self.meta
    }

    /// `true` until the record has been inserted (or was loaded from the table).
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// The primary key as loaded or last saved.
    ///
    /// This can differ from `get(primary_key)` after an unsaved assignment.
    pub fn pk(&self) -> &Value {
        &self.pk_value
    }

    /// Current value of `field`, or `None` if the table has no such column.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.meta.field_index(field).map(|i| &self.values[i])
    }

    /// Assign `field` and mark it changed, even if the value is unchanged.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> OrmResult<()> {
        let index = require_field(&self.meta, field)?;
        self.values[index] = value.into();
        self.changed.insert(index);
        Ok(())
    }

    /// Values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// `(field, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.meta.field_names().zip(self.values.iter())
    }

    /// Fields assigned since the last save, in column order.
    pub fn changed_fields(&self) -> Vec<&str> {
        self.changed
            .iter()
            .map(|&i| self.meta.fields()[i].name.as_str())
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Field values in column order; feed back to [`Model::restore`].
    pub fn snapshot(&self) -> Vec<Value> {
        self.values.clone()
    }
}

impl<M: Model> Record<M> {
    /// INSERT a new record, or UPDATE the changed fields of a persisted one.
    ///
    /// A persisted record without changes issues no statement. Changes are
    /// cleared once the statement succeeds.
    pub fn save(&mut self) -> OrmResult<&mut Self> {
        if self.is_new {
            self.set_default_values();
            self.insert()?;
            self.is_new = false;
        } else {
            self.update_changed()?;
        }
        self.changed.clear();
        Ok(self)
    }

    /// Assign every pair, then [`Record::save`].
    pub fn update<K, V>(&mut self, fields: impl IntoIterator<Item = (K, V)>) -> OrmResult<&mut Self>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in fields {
            self.set(name.as_ref(), value)?;
        }
        self.save()
    }

    /// DELETE the row identified by [`Record::pk`]; returns the affected count.
    ///
    /// `before_delete` runs first and can abort; `after_delete` runs on success.
    pub fn delete(&mut self) -> OrmResult<u64> {
        M::before_delete(self)?;

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            quote_ident(self.meta.table()),
            quote_ident(self.meta.primary_key())
        );
        let cursor = exec::execute(self.meta.client(), &sql, &[self.pk_value.clone()])?;

        M::after_delete(self)?;
        Ok(cursor.row_count())
    }

    /// Fill `Null` fields that have a default, marking them changed.
    pub(crate) fn set_default_values(&mut self) {
        let meta = Arc::clone(&self.meta);
        for (index, field) in meta.fields().iter().enumerate() {
            let Some(default) = &field.default else {
                continue;
            };
            if self.values[index].is_null() {
                self.values[index] = default.resolve();
                self.changed.insert(index);
            }
        }
    }

    fn insert(&mut self) -> OrmResult<()> {
        let meta = Arc::clone(&self.meta);
        let pk_index = meta.pk_index();

        let (mut columns, mut params): (Vec<&str>, Vec<Value>) = meta
            .field_names()
            .zip(&self.values)
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (name, value.clone()))
            .unzip();
        if columns.is_empty() {
            // No column list is valid everywhere; let the key default instead.
            columns.push(meta.primary_key());
            params.push(Value::Null);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(meta.table()),
            ident_list(columns),
            placeholders(params.len())
        );
        let cursor = exec::execute(meta.client(), &sql, &params)?;

        if self.values[pk_index].is_null() {
            if let Some(id) = cursor.last_insert_id() {
                self.values[pk_index] = Value::Int(id);
            }
        }
        self.pk_value = self.values[pk_index].clone();
        Ok(())
    }

    /// UPDATE only the changed columns, keyed by the previous primary key.
    pub(crate) fn update_changed(&mut self) -> OrmResult<()> {
        if self.changed.is_empty() {
            return Ok(());
        }

        M::before_update(self)?;

        let meta = Arc::clone(&self.meta);
        let assignments = self
            .changed
            .iter()
            .map(|&i| format!("{} = ?", quote_ident(&meta.fields()[i].name)))
            .collect::<Vec<_>>()
            .join(", ");
        let mut params: Vec<Value> = self
            .changed
            .iter()
            .map(|&i| self.values[i].clone())
            .collect();
        params.push(self.pk_value.clone());

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quote_ident(meta.table()),
            assignments,
            quote_ident(meta.primary_key())
        );
        exec::execute(meta.client(), &sql, &params)?;

        self.pk_value = self.values[meta.pk_index()].clone();
        M::after_update(self)
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

impl<M> Clone for Record<M> {
    fn clone(&self) -> Self {
        Self {
            meta: Arc::clone(&self.meta),
            values: self.values.clone(),
            is_new: self.is_new,
            pk_value: self.pk_value.clone(),
            changed: self.changed.clone(),
            _model: PhantomData,
        }
    }
}

/// Equal when both refer to the same table and hold the same values.
impl<M> PartialEq for Record<M> {
    fn eq(&self, other: &Self) -> bool {
        self.meta.table() == other.meta.table() && self.values == other.values
    }
}

impl<M> fmt::Debug for Record<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.meta.type_name());
        for (name, value) in self.iter() {
            s.field(name, value);
        }
        s.finish()
    }
}

impl<M> fmt::Display for Record<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.meta.type_name())?;
        for (name, value) in self.iter() {
            write!(f, " {name}={value}")?;
        }
        write!(f, ">")
    }
}

/// Serializes as the sequence of field values.
impl<M> Serialize for Record<M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

/// Rebuilds a persisted record of a registered model.
impl<'de, M: Model> Deserialize<'de> for Record<M> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<Value>::deserialize(deserializer)?;
        M::restore(values).map_err(serde::de::Error::custom)
    }
}

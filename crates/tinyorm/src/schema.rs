//! One-time schema introspection and the process-wide model registry.
//!
//! [`register`] binds a model type to a database handle. It issues a zero-row
//! `SELECT * FROM <table> LIMIT 0` and takes the ordered field list from the
//! result's column metadata, so the table (not the Rust type) is authoritative
//! for which fields exist. The resulting [`ModelMeta`] is cached by `TypeId`
//! and shared by every query and record of that type.

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::exec;
use crate::ident::quote_ident;
use crate::model::{DefaultValue, Model, short_type_name};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// One column of a model's table.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub default: Option<DefaultValue>,
}

/// Everything known about a registered model type.
pub struct ModelMeta {
    type_name: &'static str,
    table: String,
    primary_key: String,
    pk_index: usize,
    fields: Vec<FieldSpec>,
    client: Arc<dyn GenericClient>,
}

impl ModelMeta {
    /// Short name of the Rust model type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Position of the primary key in [`ModelMeta::fields`].
    pub fn pk_index(&self) -> usize {
        self.pk_index
    }

    /// Fields in table column order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_index(name).is_some()
    }

    /// The database handle the model was registered with.
    pub fn client(&self) -> &dyn GenericClient {
        self.client.as_ref()
    }
}

impl fmt::Debug for ModelMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelMeta")
            .field("type_name", &self.type_name)
            .field("table", &self.table)
            .field("primary_key", &self.primary_key)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

type Registry = RwLock<HashMap<TypeId, Arc<ModelMeta>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Bind `M` to `client`, introspecting its table on first call.
///
/// Later calls return the cached metadata and do not touch the database.
pub fn register<M: Model>(client: Arc<dyn GenericClient>) -> OrmResult<Arc<ModelMeta>> {
    if let Ok(meta) = lookup::<M>() {
        return Ok(meta);
    }

    let meta = Arc::new(introspect::<M>(client)?);

    let mut map = registry().write().unwrap_or_else(PoisonError::into_inner);
    // Another thread may have registered while we were introspecting; keep the first.
    let meta = map.entry(TypeId::of::<M>()).or_insert(meta).clone();

    tracing::debug!(
        target: "tinyorm.schema",
        model = meta.type_name,
        table = %meta.table,
        fields = ?meta.field_names().collect::<Vec<_>>(),
        "registered model"
    );
    Ok(meta)
}

/// Cached metadata for `M`, or [`OrmError::NotRegistered`].
pub fn lookup<M: Model>() -> OrmResult<Arc<ModelMeta>> {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&TypeId::of::<M>())
        .cloned()
        .ok_or_else(|| OrmError::NotRegistered(short_type_name(std::any::type_name::<M>())))
}

pub fn is_registered<M: Model>() -> bool {
    lookup::<M>().is_ok()
}

fn introspect<M: Model>(client: Arc<dyn GenericClient>) -> OrmResult<ModelMeta> {
    let table = M::table_name();
    let primary_key = M::PRIMARY_KEY.to_string();
    let sql = format!("SELECT * FROM {} LIMIT 0", quote_ident(&table));

    let cursor = exec::execute(client.as_ref(), &sql, &[]).map_err(|err| match err {
        OrmError::QueryExecution { source, .. } => OrmError::schema(&table, source.to_string()),
        other => OrmError::schema(&table, other.to_string()),
    })?;

    let columns = cursor.description();
    if columns.is_empty() {
        return Err(OrmError::schema(&table, "table reports no columns"));
    }

    let pk_index = columns
        .iter()
        .position(|c| *c == primary_key)
        .ok_or_else(|| {
            OrmError::schema(
                &table,
                format!("primary key column `{primary_key}` not found"),
            )
        })?;

    let defaults = M::defaults();
    let fields = columns
        .iter()
        .map(|name| FieldSpec {
            name: name.clone(),
            default: defaults.get(name).filter(|d| !d.is_noop()).cloned(),
        })
        .collect();

    Ok(ModelMeta {
        type_name: short_type_name(std::any::type_name::<M>()),
        table,
        primary_key,
        pk_index,
        fields,
        client,
    })
}

#[cfg(test)]
mod tests;

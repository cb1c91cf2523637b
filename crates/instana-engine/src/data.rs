//! schema-bound state tree of a single resource instance.

use instana_core::{Schema, StateError, StateMap, Value};
use std::ops::Deref;

/// key holding the api assigned identifier.
pub const ID_KEY: &str = "id";

#[derive(Debug, Clone)]
pub struct ResourceData<'s> {
    schema: &'s Schema,
    state: StateMap,
}

impl<'s> ResourceData<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            state: StateMap::new(),
        }
    }

    /// wrap an existing state tree, normalizing it through the schema.
    pub fn from_state(schema: &'s Schema, state: StateMap) -> Result<Self, StateError> {
        let state = schema.normalize(state)?;
        Ok(Self { schema, state })
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn id(&self) -> &str {
        self.state
            .get(ID_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        if id.is_empty() {
            self.state.remove(ID_KEY);
        } else {
            self.state.insert(ID_KEY.to_string(), Value::String(id));
        }
    }

    /// write a field, normalizing it through its schema.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), StateError> {
        if key == ID_KEY {
            let value = value.into();
            self.set_id(value.as_str().unwrap_or_default());
            return Ok(());
        }
        let field = self
            .schema
            .field(key)
            .ok_or_else(|| StateError::UnknownField(key.to_string()))?;
        let value = field.normalize(key, value.into())?;
        self.state.insert(key.to_string(), value);
        Ok(())
    }

    /// write several fields at once.
    pub fn set_all<I>(&mut self, fields: I) -> Result<(), StateError>
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        for (key, value) in fields {
            self.set(key, value)?;
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.state.remove(key)
    }

    /// drop every value, marking the resource as absent.
    pub fn clear(&mut self) {
        self.state.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// materialize schema defaults for unset fields.
    pub fn apply_defaults(&mut self) {
        self.schema.apply_defaults(&mut self.state);
    }

    pub fn state(&self) -> &StateMap {
        &self.state
    }

    pub fn into_state(self) -> StateMap {
        self.state
    }
}

impl Deref for ResourceData<'_> {
    type Target = StateMap;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

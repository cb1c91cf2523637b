use super::*;
use async_trait::async_trait;
use instana_core::{FieldSchema, ResourceNameFormatter, Schema, StateMap, StateMapExt, Value};
use instana_restapi::{
    ClientConfig, InstanaApi, InstanaClient, InstanaDataObject, ReadOnlyRestResource, RestError,
    RestResource,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Note {
    #[serde(default)]
    id: String,
    name: String,
    body: String,
    priority: i64,
}

impl InstanaDataObject for Note {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[derive(Default)]
struct FakeFacet {
    store: Mutex<BTreeMap<String, Note>>,
    next_id: AtomicU64,
    fail_writes: AtomicBool,
}

impl FakeFacet {
    fn insert(&self, note: Note) {
        self.store.lock().unwrap().insert(note.id.clone(), note);
    }

    fn stored(&self, id: &str) -> Option<Note> {
        self.store.lock().unwrap().get(id).cloned()
    }

    fn check_writable(&self) -> Result<(), RestError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RestError::Status {
                url: "fake".to_string(),
                status: 500,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ReadOnlyRestResource<Note> for FakeFacet {
    async fn get_all(&self) -> Result<Vec<Note>, RestError> {
        Ok(self.store.lock().unwrap().values().cloned().collect())
    }

    async fn get_one(&self, id: &str) -> Result<Note, RestError> {
        self.stored(id).ok_or_else(|| RestError::NotFound {
            url: format!("fake/{id}"),
        })
    }
}

#[async_trait]
impl RestResource<Note> for FakeFacet {
    async fn create(&self, object: &Note) -> Result<Note, RestError> {
        self.check_writable()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut created = object.clone();
        created.id = id.to_string();
        self.insert(created.clone());
        Ok(created)
    }

    async fn update(&self, object: &Note) -> Result<Note, RestError> {
        self.check_writable()?;
        self.insert(object.clone());
        Ok(object.clone())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), RestError> {
        match self.store.lock().unwrap().remove(id) {
            Some(_) => Ok(()),
            None => Err(RestError::NotFound {
                url: format!("fake/{id}"),
            }),
        }
    }
}

struct NoteHandle {
    metadata: ResourceMetadata,
    facet: FakeFacet,
}

impl NoteHandle {
    fn new() -> Self {
        let schema = Schema::new([
            ("name", FieldSchema::string().required()),
            ("full_name", FieldSchema::string().computed()),
            ("body", FieldSchema::string().optional()),
            ("priority", FieldSchema::int().default(3i64)),
        ]);
        Self {
            metadata: ResourceMetadata::new("test_note", schema, 1),
            facet: FakeFacet::default(),
        }
    }
}

impl ResourceHandle for NoteHandle {
    type Object = Note;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, full_name_to_name)]
    }

    fn rest_resource<'a>(&'a self, _api: &'a dyn InstanaApi) -> &'a dyn RestResource<Note> {
        &self.facet
    }

    fn set_computed_fields(
        &self,
        data: &mut ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        let full_name = formatter.format(&data.string("name"));
        data.set("full_name", full_name)?;
        Ok(())
    }

    fn update_state(
        &self,
        data: &mut ResourceData<'_>,
        object: &Note,
        formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        data.set("full_name", object.name.as_str())?;
        data.set("name", formatter.undo_format(&object.name))?;
        data.set("body", object.body.as_str())?;
        data.set("priority", object.priority)?;
        Ok(())
    }

    fn map_state_to_data_object(
        &self,
        data: &ResourceData<'_>,
        formatter: &ResourceNameFormatter,
    ) -> Result<Note, ProviderError> {
        let body = data.string("body");
        if body == "invalid" {
            return Err(ProviderError::invalid("body", "body must not be invalid"));
        }
        Ok(Note {
            id: data.id().to_string(),
            name: formatter.format(&data.string("name")),
            body,
            priority: data.i64("priority"),
        })
    }
}

fn meta() -> ProviderMeta {
    let api = InstanaClient::new(&ClientConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        api_token: "unused".to_string(),
        skip_tls_verify: false,
    })
    .unwrap();
    ProviderMeta::new(Arc::new(api), ResourceNameFormatter::new("p ", " s"))
}

fn note(id: &str, name: &str) -> Note {
    Note {
        id: id.to_string(),
        name: name.to_string(),
        body: "hello".to_string(),
        priority: 1,
    }
}

#[tokio::test]
async fn create_writes_full_name_defaults_and_id() {
    let driver = ResourceDriver::new(NoteHandle::new());
    let meta = meta();
    let schema = driver.handle().metadata().schema.clone();
    let mut data = ResourceData::new(&schema);
    data.set("name", "n").unwrap();

    driver.create(&meta, &mut data).await.unwrap();

    assert_eq!(data.id(), "1");
    assert_eq!(data.string("full_name"), "p n s");
    assert_eq!(data.string("name"), "n");
    assert_eq!(data.i64("priority"), 3);
    let stored = driver.handle().facet.stored("1").unwrap();
    assert_eq!(stored.name, "p n s");
    assert_eq!(stored.priority, 3);
}

#[tokio::test]
async fn create_failure_leaves_state_empty() {
    let driver = ResourceDriver::new(NoteHandle::new());
    driver.handle().facet.fail_writes.store(true, Ordering::SeqCst);
    let meta = meta();
    let schema = driver.handle().metadata().schema.clone();
    let mut data = ResourceData::new(&schema);
    data.set("name", "n").unwrap();

    let err = driver.create(&meta, &mut data).await.unwrap_err();
    assert!(matches!(err, ProviderError::Remote(RestError::Status { status: 500, .. })));
    assert!(data.is_empty());
}

#[tokio::test]
async fn update_mapping_failure_keeps_state() {
    let driver = ResourceDriver::new(NoteHandle::new());
    driver.handle().facet.insert(note("9", "p n s"));
    let meta = meta();
    let schema = driver.handle().metadata().schema.clone();
    let mut data = ResourceData::new(&schema);
    data.set_id("9");
    data.set("name", "n").unwrap();
    data.set("body", "invalid").unwrap();
    let before = data.state().clone();

    let err = driver.update(&meta, &mut data).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidConfiguration { .. }));
    assert_eq!(data.state(), &before);
    assert_eq!(driver.handle().facet.stored("9").unwrap().body, "hello");
}

#[tokio::test]
async fn update_keeps_id_and_rewrites_full_name() {
    let driver = ResourceDriver::new(NoteHandle::new());
    driver.handle().facet.insert(note("9", "p old s"));
    let meta = meta();
    let schema = driver.handle().metadata().schema.clone();
    let mut data = ResourceData::new(&schema);
    data.set_id("9");
    data.set("name", "new").unwrap();
    data.set("full_name", "p old s").unwrap();

    driver.update(&meta, &mut data).await.unwrap();

    assert_eq!(data.id(), "9");
    assert_eq!(data.string("full_name"), "p new s");
    assert_eq!(driver.handle().facet.stored("9").unwrap().name, "p new s");
}

#[tokio::test]
async fn read_of_missing_object_clears_id() {
    let driver = ResourceDriver::new(NoteHandle::new());
    let meta = meta();
    let schema = driver.handle().metadata().schema.clone();
    let mut data = ResourceData::new(&schema);
    data.set_id("404");
    data.set("name", "n").unwrap();

    driver.read(&meta, &mut data).await.unwrap();
    assert_eq!(data.id(), "");
}

#[tokio::test]
async fn read_refreshes_state_from_remote() {
    let driver = ResourceDriver::new(NoteHandle::new());
    driver.handle().facet.insert(note("5", "p remote s"));
    let meta = meta();
    let schema = driver.handle().metadata().schema.clone();
    let mut data = ResourceData::new(&schema);
    data.set_id("5");

    driver.read(&meta, &mut data).await.unwrap();
    assert_eq!(data.string("name"), "remote");
    assert_eq!(data.string("full_name"), "p remote s");
    assert_eq!(data.get("priority"), Some(&Value::Int(1)));
}

#[tokio::test]
async fn delete_treats_missing_object_as_deleted() {
    let driver = ResourceDriver::new(NoteHandle::new());
    driver.handle().facet.insert(note("1", "p a s"));
    let meta = meta();
    let schema = driver.handle().metadata().schema.clone();

    let mut data = ResourceData::new(&schema);
    data.set_id("1");
    driver.delete(&meta, &mut data).await.unwrap();
    assert_eq!(data.id(), "");
    assert!(driver.handle().facet.stored("1").is_none());

    let mut data = ResourceData::new(&schema);
    data.set_id("2");
    driver.delete(&meta, &mut data).await.unwrap();
    assert_eq!(data.id(), "");
}

#[tokio::test]
async fn import_reads_existing_and_rejects_absent() {
    let driver = ResourceDriver::new(NoteHandle::new());
    driver.handle().facet.insert(note("7", "p imported s"));
    let meta = meta();
    let schema = driver.handle().metadata().schema.clone();

    let mut data = ResourceData::new(&schema);
    driver.import(&meta, &mut data, "7").await.unwrap();
    assert_eq!(data.id(), "7");
    assert_eq!(data.string("name"), "imported");

    let mut data = ResourceData::new(&schema);
    let err = driver.import(&meta, &mut data, "8").await.unwrap_err();
    assert!(matches!(err, ProviderError::NotFound { .. }));
}

#[tokio::test]
async fn registry_dispatches_by_name() {
    let mut registry = ProviderRegistry::new();
    registry.register_resource(NoteHandle::new());
    let meta = meta();

    let resource = registry.resource("test_note").unwrap();
    assert_eq!(resource.schema_version(), 1);
    assert!(registry.resource("missing").is_none());

    let legacy = polymorphic::state_map([("full_name", Value::from("legacy"))]);
    let upgraded = upgrade_state(&resource.state_upgraders(), 0, legacy).unwrap();
    let mut data = ResourceData::from_state(resource.schema(), upgraded).unwrap();
    assert_eq!(data.string("name"), "legacy");

    resource.create(&meta, &mut data).await.unwrap();
    assert_eq!(data.string("full_name"), "p legacy s");
    assert!(resource.schema().validate(data.state()).is_empty());
}

struct NoteLookup {
    metadata: ResourceMetadata,
    facet: FakeFacet,
}

impl NoteLookup {
    fn with_notes(notes: Vec<Note>) -> Self {
        let schema = Schema::new([
            ("name", FieldSchema::string().required()),
            ("body", FieldSchema::string().computed()),
        ]);
        let facet = FakeFacet::default();
        for note in notes {
            facet.insert(note);
        }
        Self {
            metadata: ResourceMetadata::new("test_note_lookup", schema, 0),
            facet,
        }
    }
}

impl DataSourceHandle for NoteLookup {
    type Object = Note;

    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn rest_resource<'a>(&'a self, _api: &'a dyn InstanaApi) -> &'a dyn ReadOnlyRestResource<Note> {
        &self.facet
    }

    fn matches(
        &self,
        data: &ResourceData<'_>,
        object: &Note,
        formatter: &ResourceNameFormatter,
    ) -> bool {
        object.name == formatter.format(&data.string("name"))
    }

    fn update_state(
        &self,
        data: &mut ResourceData<'_>,
        object: &Note,
        _formatter: &ResourceNameFormatter,
    ) -> Result<(), ProviderError> {
        data.set("body", object.body.as_str())?;
        Ok(())
    }
}

async fn lookup(notes: Vec<Note>) -> (Result<(), ProviderError>, StateMap) {
    let driver = DataSourceDriver::new(NoteLookup::with_notes(notes));
    let schema = driver.handle().metadata().schema.clone();
    let mut data = ResourceData::new(&schema);
    data.set("name", "wanted").unwrap();
    let result = driver.read(&meta(), &mut data).await;
    (result, data.into_state())
}

#[tokio::test]
async fn data_source_resolves_single_match() {
    let (result, state) = lookup(vec![note("1", "p wanted s"), note("2", "p other s")]).await;
    result.unwrap();
    assert_eq!(state.string("id"), "1");
    assert_eq!(state.string("body"), "hello");
}

#[tokio::test]
async fn data_source_without_match_is_not_found() {
    let (result, state) = lookup(vec![note("2", "p other s")]).await;
    assert!(result.unwrap_err().is_not_found());
    assert_eq!(state.string("id"), "");
}

#[tokio::test]
async fn data_source_with_several_matches_is_ambiguous() {
    let (result, _) = lookup(vec![note("1", "p wanted s"), note("3", "p wanted s")]).await;
    assert!(matches!(result, Err(ProviderError::Ambiguous { .. })));
}

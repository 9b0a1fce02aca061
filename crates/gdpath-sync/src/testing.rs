//! In-memory remote store for resolver and operation tests

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use gdpath_core::domain::RemoteId;
use gdpath_core::ports::{
    ApiError, DriveFile, DriveOp, DriveReply, FilePage, RemoteStore, FOLDER_MIME, SPREADSHEET_MIME,
};

#[derive(Debug, Clone)]
pub struct FakeObject {
    pub name: String,
    pub mime_type: Option<String>,
    pub parents: Vec<RemoteId>,
    pub created_time: String,
    pub content: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<RemoteId, FakeObject>,
    next_id: u32,
    calls: Vec<&'static str>,
    formats: Vec<serde_json::Value>,
}

impl State {
    fn insert(&mut self, name: &str, mime_type: Option<&str>, parents: Vec<RemoteId>) -> RemoteId {
        self.next_id += 1;
        let id = RemoteId::new(format!("obj{}", self.next_id)).unwrap();
        let object = FakeObject {
            name: name.to_string(),
            mime_type: mime_type.map(str::to_string),
            parents,
            // 24-character RFC 3339 timestamps, one second apart
            created_time: format!(
                "2026-01-01T{:02}:{:02}:{:02}.000Z",
                self.next_id / 3600,
                self.next_id / 60 % 60,
                self.next_id % 60
            ),
            content: None,
        };
        self.objects.insert(id.clone(), object);
        id
    }

    fn get_mut(&mut self, id: &RemoteId) -> Result<&mut FakeObject, ApiError> {
        self.objects.get_mut(id).ok_or_else(|| ApiError::Status {
            status: 404,
            message: format!("File not found: {id}"),
        })
    }
}

/// Drive double holding the object graph in memory
///
/// Every call yields to the scheduler first so that concurrent resolvers
/// interleave the way separate processes would.
#[derive(Debug, Default)]
pub struct FakeDrive {
    state: Mutex<State>,
}

impl FakeDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_folder(&self, name: &str, parent: &RemoteId) -> RemoteId {
        self.state
            .lock()
            .unwrap()
            .insert(name, Some(FOLDER_MIME), vec![parent.clone()])
    }

    pub fn add_file(&self, name: &str, parent: &RemoteId) -> RemoteId {
        self.state
            .lock()
            .unwrap()
            .insert(name, Some("text/plain"), vec![parent.clone()])
    }

    pub fn object(&self, id: &RemoteId) -> Option<FakeObject> {
        self.state.lock().unwrap().objects.get(id).cloned()
    }

    /// IDs of every object named `name` under `parent`
    pub fn named(&self, parent: &RemoteId, name: &str) -> Vec<RemoteId> {
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .filter(|(_, o)| o.name == name && o.parents.contains(parent))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of calls made with the given command tag
    pub fn count(&self, op: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == op)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn formats(&self) -> Vec<serde_json::Value> {
        self.state.lock().unwrap().formats.clone()
    }

    fn apply(&self, op: &DriveOp) -> Result<DriveReply, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op.name());

        match op {
            DriveOp::List { query, .. } => {
                let files = state
                    .objects
                    .iter()
                    .map(|(id, o)| {
                        let file = DriveFile {
                            id: id.clone(),
                            name: o.name.clone(),
                            mime_type: o.mime_type.clone(),
                            created_time: Some(o.created_time.clone()),
                        };
                        (file, o.parents.clone())
                    })
                    .filter(|(file, parents)| query.matches(file, parents))
                    .map(|(file, _)| file)
                    .collect();
                Ok(DriveReply::Page(FilePage {
                    files: Some(files),
                    next_page_token: None,
                }))
            }
            DriveOp::Get { id } => Ok(DriveReply::Parents(state.get_mut(id)?.parents.clone())),
            DriveOp::Create { metadata } => {
                let id = state.insert(
                    &metadata.name,
                    metadata.mime_type.as_deref(),
                    metadata.parents.clone(),
                );
                Ok(DriveReply::Created(id))
            }
            DriveOp::Rename { id, name } => {
                state.get_mut(id)?.name = name.clone();
                Ok(DriveReply::Done)
            }
            DriveOp::Delete { id } => {
                state.get_mut(id)?;
                state.objects.remove(id);
                Ok(DriveReply::Done)
            }
            DriveOp::Move { id, new_parent } => {
                state.get_mut(id)?.parents = vec![new_parent.clone()];
                Ok(DriveReply::Done)
            }
            DriveOp::Upload { metadata, media } => {
                let id = state.insert(
                    &metadata.name,
                    metadata.mime_type.as_deref().or(Some(media.mime_type.as_str())),
                    metadata.parents.clone(),
                );
                state.get_mut(&id)?.content = Some(media.bytes.clone());
                Ok(DriveReply::Created(id))
            }
            DriveOp::CreateSheet { title } => {
                let id = state.insert(title, Some(SPREADSHEET_MIME), vec![RemoteId::root()]);
                Ok(DriveReply::Sheet(id))
            }
            DriveOp::FormatSheet {
                spreadsheet_id,
                requests,
            } => {
                state.get_mut(spreadsheet_id)?;
                state.formats.push(requests.clone());
                Ok(DriveReply::Done)
            }
        }
    }
}

#[async_trait]
impl RemoteStore for FakeDrive {
    async fn call(&self, op: &DriveOp) -> Result<DriveReply, ApiError> {
        tokio::task::yield_now().await;
        self.apply(op)
    }
}

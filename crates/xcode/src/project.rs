//! Xcode project file manipulation
//!
//! Reads a `.xcodeproj/project.pbxproj` into an object graph, edits it in
//! memory, and writes it back in the layout Xcode uses.

use crate::parser;
use crate::plist::{Dict, Value};
use crate::writer;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use xcspm_core::error::{Error, Result, ResultExt};

const PBXPROJ: &str = "project.pbxproj";

/// Represents an Xcode project
#[derive(Debug)]
pub struct XcodeProject {
    /// The `.xcodeproj` bundle
    pub path: PathBuf,
    /// The `project.pbxproj` file inside the bundle
    pub pbxproj_path: PathBuf,
    top: Dict,
    objects: BTreeMap<String, Dict>,
    annotations: HashMap<String, String>,
    root_object_id: String,
}

/// Target in the project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: String,
    pub name: String,
    pub isa: String,
}

impl XcodeProject {
    /// Open an Xcode project
    ///
    /// `path` is either the `.xcodeproj` directory or its `project.pbxproj`.
    pub fn open(path: &Path) -> Result<Self> {
        let (bundle, pbxproj_path) = resolve_paths(path);
        if !pbxproj_path.is_file() {
            return Err(Error::project_not_found(path));
        }

        let content = fs::read_to_string(&pbxproj_path)?;
        Self::parse(&content, &bundle)
            .context(format!("While reading {}", pbxproj_path.display()))
    }

    /// Parse project file text; `path` is the `.xcodeproj` it belongs to
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let document = parser::parse(content)?;
        let mut top = document.root;

        let objects = match top.get_mut("objects") {
            Some(Value::Dict(objects)) => std::mem::take(objects),
            _ => return Err(Error::project("Project file has no objects dictionary")),
        };

        let mut by_id = BTreeMap::new();
        for (id, value) in objects.iter() {
            match value {
                Value::Dict(object) if object.isa().is_some() => {
                    by_id.insert(id.to_string(), object.clone());
                }
                _ => {
                    return Err(Error::project(format!("Object {} has no isa", id)));
                }
            }
        }

        let root_object_id = top
            .get_str("rootObject")
            .ok_or_else(|| Error::project("Project file has no rootObject"))?
            .to_string();
        if !by_id.contains_key(&root_object_id) {
            return Err(Error::dangling_reference(&root_object_id).with_context("rootObject"));
        }

        let annotations = document
            .key_annotations
            .into_iter()
            .filter(|(id, _)| by_id.contains_key(id))
            .collect();

        let pbxproj_path = path.join(PBXPROJ);
        Ok(Self {
            path: path.to_path_buf(),
            pbxproj_path,
            top,
            objects: by_id,
            annotations,
            root_object_id,
        })
    }

    /// Project file name for messages, e.g. `Plugin.xcodeproj`
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Serialize the project in Xcode's layout
    pub fn to_pbxproj_string(&self) -> String {
        writer::write_project(&self.top, &self.objects, &self.annotations)
    }

    /// Write the project back to `project.pbxproj`
    ///
    /// The new content goes to a temporary file in the same directory which
    /// then replaces the original, so readers never see a partial file.
    pub fn save(&self) -> Result<()> {
        let dir = self
            .pbxproj_path
            .parent()
            .ok_or_else(|| Error::io("Invalid project path"))?;

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(self.to_pbxproj_string().as_bytes())?;
        if let Ok(metadata) = fs::metadata(&self.pbxproj_path) {
            fs::set_permissions(file.path(), metadata.permissions())?;
        }
        file.persist(&self.pbxproj_path).map_err(|e| Error::from(e.error))?;

        tracing::debug!(path = %self.pbxproj_path.display(), "Saved project");
        Ok(())
    }

    pub fn object(&self, id: &str) -> Option<&Dict> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: &str) -> Option<&mut Dict> {
        self.objects.get_mut(id)
    }

    /// The `PBXProject` object
    pub fn root_object(&self) -> Result<&Dict> {
        self.objects
            .get(&self.root_object_id)
            .ok_or_else(|| Error::dangling_reference(&self.root_object_id))
    }

    pub fn root_object_mut(&mut self) -> Result<&mut Dict> {
        let id = self.root_object_id.clone();
        self.objects
            .get_mut(&id)
            .ok_or_else(|| Error::dangling_reference(&id))
    }

    /// Targets in the order the project lists them
    pub fn targets(&self) -> Vec<Target> {
        let Ok(root) = self.root_object() else {
            return Vec::new();
        };

        root.get_array("targets")
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .filter_map(|id| {
                let object = self.objects.get(id)?;
                Some(Target {
                    id: id.to_string(),
                    name: object.get_str("name").unwrap_or_default().to_string(),
                    isa: object.isa().unwrap_or_default().to_string(),
                })
            })
            .collect()
    }

    /// Display annotation of an object
    pub fn annotation(&self, id: &str) -> Option<&str> {
        self.annotations.get(id).map(String::as_str)
    }

    /// A reference to `id` as Xcode writes it, with its annotation
    pub fn reference(&self, id: &str) -> Value {
        match self.annotations.get(id) {
            Some(annotation) => Value::Annotated(id.to_string(), annotation.clone()),
            None => Value::String(id.to_string()),
        }
    }

    /// Add a new object and return its generated id
    pub fn add_object(&mut self, object: Dict, annotation: Option<String>) -> String {
        let id = self.generate_id();
        tracing::debug!(id = %id, isa = object.isa().unwrap_or_default(), "Adding object");
        if let Some(annotation) = annotation {
            self.annotations.insert(id.clone(), annotation);
        }
        self.objects.insert(id.clone(), object);
        id
    }

    /// Remove an object and every reference other objects hold to it
    pub fn remove_object(&mut self, id: &str) -> Option<Dict> {
        let removed = self.objects.remove(id)?;
        self.annotations.remove(id);
        for object in self.objects.values_mut() {
            scrub_references(object, id);
        }
        tracing::debug!(id = %id, isa = removed.isa().unwrap_or_default(), "Removed object");
        Some(removed)
    }

    /// A fresh 24-digit uppercase hex id not used by any object
    fn generate_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().simple().to_string().to_uppercase()[..24].to_string();
            if !self.objects.contains_key(&id) {
                return id;
            }
        }
    }
}

/// The `.xcodeproj` bundle for a path to the bundle or its `project.pbxproj`
pub fn bundle_path(path: &Path) -> PathBuf {
    resolve_paths(path).0
}

/// Split a user-supplied path into the bundle and its `project.pbxproj`
fn resolve_paths(path: &Path) -> (PathBuf, PathBuf) {
    if path.file_name().is_some_and(|n| n == PBXPROJ) {
        let bundle = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        (bundle, path.to_path_buf())
    } else {
        (path.to_path_buf(), path.join(PBXPROJ))
    }
}

fn scrub_references(dict: &mut Dict, id: &str) {
    dict.entries_mut()
        .retain(|(key, value)| key != id && !value.is_str(id));
    for (_, value) in dict.entries_mut().iter_mut() {
        scrub_value(value, id);
    }
}

fn scrub_value(value: &mut Value, id: &str) {
    match value {
        Value::Array(items) => {
            items.retain(|item| !item.is_str(id));
            for item in items.iter_mut() {
                scrub_value(item, id);
            }
        }
        Value::Dict(dict) => scrub_references(dict, id),
        Value::String(_) | Value::Annotated(_, _) => {}
    }
}

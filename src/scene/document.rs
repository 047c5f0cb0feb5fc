use crate::foundation::error::{MotionError, MotionResult};
use crate::scene::model::{DOCUMENT_VERSION, DocumentDef, ElementDef};
use crate::schema::validate::validate_document;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Document boundary object.
///
/// This is the JSON-facing representation produced by the extraction step. It is validated and
/// ingested into a [`crate::RenderTree`] arena when an [`crate::Engine`] is initialized.
#[derive(Debug, Clone)]
pub struct Document {
    def: DocumentDef,
}

impl Document {
    /// Wrap an element tree in a current-version document.
    pub fn new(root: ElementDef) -> Self {
        Self {
            def: DocumentDef {
                version: DOCUMENT_VERSION.to_owned(),
                name: None,
                root,
            },
        }
    }

    /// Parse a document from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> MotionResult<Self> {
        let def: DocumentDef = serde_json::from_reader(r)
            .map_err(|e| MotionError::serde(format!("parse document JSON: {e}")))?;
        Ok(Self { def })
    }

    /// Parse a document from a JSON string.
    pub fn from_json_str(s: &str) -> MotionResult<Self> {
        let def: DocumentDef = serde_json::from_str(s)
            .map_err(|e| MotionError::serde(format!("parse document JSON: {e}")))?;
        Ok(Self { def })
    }

    /// Parse a document from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> MotionResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MotionError::validation(format!("open document JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Validate the document against the schema.
    pub fn validate(&self) -> MotionResult<()> {
        validate_document(&self.def)
            .map_err(|e| MotionError::validation(format!("document schema validation failed: {e}")))
    }

    /// Serialize back to pretty JSON.
    pub fn to_json_pretty(&self) -> MotionResult<String> {
        serde_json::to_string_pretty(&self.def).map_err(|e| MotionError::serde(e.to_string()))
    }

    /// Document name, if any.
    pub fn name(&self) -> Option<&str> {
        self.def.name.as_deref()
    }

    /// Root element.
    pub fn root(&self) -> &ElementDef {
        &self.def.root
    }

    pub(crate) fn def(&self) -> &DocumentDef {
        &self.def
    }
}

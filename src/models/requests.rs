use serde::{Deserialize, Serialize};

/// Body of `/upload` and `/download`.
///
/// Missing fields decode as empty strings so the handler can answer with the
/// "required" message instead of a decode failure.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct FileRequest {
    pub base_root: String,
    pub file_path: String,
}

/// Body of `/upload-folder` and `/download-folder`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct FolderRequest {
    pub base_root: String,
    pub folder_path: String,
}

impl FileRequest {
    pub fn is_complete(&self) -> bool {
        !self.base_root.is_empty() && !self.file_path.is_empty()
    }
}

impl FolderRequest {
    pub fn is_complete(&self) -> bool {
        !self.base_root.is_empty() && !self.folder_path.is_empty()
    }
}

//! Shared fixtures for the integration suites.
#![allow(dead_code)] // each suite uses a different subset

use carta_pipeline::{AnalysisResult, CancelToken, FileEntry, Pipeline, ProgressEvent};

/// Run the full pipeline over the given files, discarding progress.
pub fn run_pipeline(files: Vec<FileEntry>) -> AnalysisResult {
    run_pipeline_with_events(files).0
}

/// Run the full pipeline and also return the emitted progress events.
pub fn run_pipeline_with_events(files: Vec<FileEntry>) -> (AnalysisResult, Vec<ProgressEvent>) {
    let pipeline = Pipeline::with_defaults();
    let cancel = CancelToken::new();
    let mut events = Vec::new();
    let result = pipeline
        .run(files, &mut |e| events.push(e), &cancel)
        .expect("pipeline run succeeds");
    (result, events)
}

pub fn entry(path: &str, content: &str) -> FileEntry {
    FileEntry::new(path, content)
}

/// A small cross-language project exercising every edge stage.
pub fn sample_project() -> Vec<FileEntry> {
    vec![
        entry(
            "src/auth/login.ts",
            "import { createSession } from './session';\n\
             export function login(user: string) { return createSession(user); }\n",
        ),
        entry(
            "src/auth/session.ts",
            "export function createSession(user: string) { return audit(user); }\n\
             function audit(user: string) { return user; }\n",
        ),
        entry(
            "src/models.py",
            "class Base:\n    pass\n\nclass Account(Base):\n    def __init__(self):\n        pass\n",
        ),
        entry(
            "src/main.ts",
            "import { login } from './auth/login';\nexport function main() { login('root'); }\n",
        ),
    ]
}

//! Background imports. The worker thread owns its own [`Store`]; the caller
//! only ever sees messages.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use tracing::warn;

use crate::db::Store;
use crate::error::{Result, SheetbookError};
use crate::importer::{ImportConfig, Importer};
use crate::models::ImportSummary;

#[derive(Debug, Clone, PartialEq)]
pub enum ImportMessage {
    Progress(String),
    Finished(ImportSummary),
    Failed(String),
}

pub struct ImportHandle {
    messages: Receiver<ImportMessage>,
    handle: JoinHandle<()>,
}

impl ImportHandle {
    /// Drains progress into `on_progress` until the worker finishes, then
    /// returns the batch total.
    pub fn wait(self, mut on_progress: impl FnMut(&str)) -> Result<ImportSummary> {
        let ImportHandle { messages, handle } = self;
        let mut outcome = None;
        for message in messages.iter() {
            match message {
                ImportMessage::Progress(line) => on_progress(&line),
                ImportMessage::Finished(summary) => outcome = Some(Ok(summary)),
                ImportMessage::Failed(reason) => outcome = Some(Err(SheetbookError::Other(reason))),
            }
        }
        handle
            .join()
            .map_err(|_| SheetbookError::Other("import worker panicked".into()))?;
        outcome.unwrap_or_else(|| {
            Err(SheetbookError::Other(
                "import worker exited without a result".into(),
            ))
        })
    }
}

pub fn spawn_import(db_path: PathBuf, config: ImportConfig, files: Vec<PathBuf>) -> ImportHandle {
    let (tx, messages) = mpsc::channel();
    let handle = std::thread::spawn(move || run_batch(&db_path, config, &files, &tx));
    ImportHandle { messages, handle }
}

fn run_batch(db_path: &Path, config: ImportConfig, files: &[PathBuf], tx: &Sender<ImportMessage>) {
    let store = match Store::open(db_path) {
        Ok(store) => store,
        Err(e) => {
            let _ = tx.send(ImportMessage::Failed(format!(
                "could not open {}: {e}",
                db_path.display()
            )));
            return;
        }
    };

    let mut total = ImportSummary::default();
    {
        let progress = tx.clone();
        let mut importer = Importer::new(&store, config).with_progress(move |line: &str| {
            let _ = progress.send(ImportMessage::Progress(line.to_string()));
        });
        for (i, file) in files.iter().enumerate() {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file.display().to_string());
            let _ = tx.send(ImportMessage::Progress(format!(
                "Importing {}/{}: {name}...",
                i + 1,
                files.len()
            )));
            total += importer.import_file(file);
        }
    }

    if let Err(e) = store.close() {
        warn!(error = %e, "failed to close store after import");
    }
    let _ = tx.send(ImportMessage::Finished(total));
}

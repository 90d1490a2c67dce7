use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tarry_core::{Signal, remember, signal};
use thiserror::Error;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInputOptions {
    /// Comma separated `.ext`, `type/*` or exact MIME tokens, like an HTML
    /// `accept` attribute. Empty means anything.
    pub accept: Option<String>,
    /// Size limit in megabytes. Zero or less means no limit.
    pub max_size_mb: Option<f64>,
}

impl FileInputOptions {
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn max_size_mb(mut self, mb: f64) -> Self {
        self.max_size_mb = Some(mb);
        self
    }

    /// Checks `file` against the size limit, then the type filter.
    pub fn check(&self, file: &SelectedFile) -> Result<(), FileRejected> {
        if let Some(max_mb) = self.max_size_mb.filter(|mb| *mb > 0.0)
            && file.size as f64 > max_mb * BYTES_PER_MB
        {
            return Err(FileRejected::TooLarge {
                max_mb,
                size: file.size,
            });
        }

        if let Some(accept) = self.accept.as_deref().filter(|a| !a.trim().is_empty())
            && !accepts(accept, file)
        {
            return Err(FileRejected::WrongType {
                accept: accept.to_string(),
                mime: file.mime.clone(),
            });
        }
        Ok(())
    }
}

/// A file picked by the user, as reported by the platform picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub mime: String,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, size: u64, mime: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime: mime.into(),
        }
    }

    pub fn size_mb(&self) -> f64 {
        self.size as f64 / BYTES_PER_MB
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FileRejected {
    #[error("File size must be less than {max_mb}MB")]
    TooLarge { max_mb: f64, size: u64 },

    #[error("File type must be {accept}")]
    WrongType { accept: String, mime: String },
}

/// Whether `file` matches any token of an `accept` list.
pub fn accepts(accept: &str, file: &SelectedFile) -> bool {
    accept
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .any(|token| {
            if token.starts_with('.') {
                file.name
                    .to_ascii_lowercase()
                    .ends_with(&token.to_ascii_lowercase())
            } else if let Some(major) = token.strip_suffix("/*") {
                major == "*"
                    || file
                        .mime
                        .split_once('/')
                        .is_some_and(|(m, _)| m.eq_ignore_ascii_case(major))
            } else {
                file.mime.eq_ignore_ascii_case(token)
            }
        })
}

/// Selection state behind a file picker.
pub struct FileInput {
    options: RefCell<FileInputOptions>,
    file_name: Signal<Option<String>>,
    file_size: Signal<u64>,
    error: Signal<Option<FileRejected>>,
}

impl FileInput {
    pub fn new(options: FileInputOptions) -> Self {
        Self {
            options: RefCell::new(options),
            file_name: signal(None),
            file_size: signal(0),
            error: signal(None),
        }
    }

    pub fn options(&self) -> FileInputOptions {
        self.options.borrow().clone()
    }

    pub fn set_options(&self, options: FileInputOptions) {
        *self.options.borrow_mut() = options;
    }

    /// Handles a picker change. The previous error is cleared first; a
    /// rejected file leaves the previous selection in place. `None` (the
    /// picker was dismissed) changes nothing else.
    pub fn validate_and_set(&self, file: Option<SelectedFile>) -> Result<(), FileRejected> {
        self.error.set(None);
        let Some(file) = file else {
            return Ok(());
        };

        let checked = self.options.borrow().check(&file);
        if let Err(rejected) = checked {
            log::debug!("file input: rejected {:?}: {rejected}", file.name);
            self.error.set(Some(rejected.clone()));
            return Err(rejected);
        }

        self.file_size.set(file.size);
        self.file_name.set(Some(file.name));
        Ok(())
    }

    pub fn clear(&self) {
        self.file_name.set(None);
        self.error.set(None);
        self.file_size.set(0);
    }

    pub fn file_name(&self) -> Option<String> {
        self.file_name.get()
    }

    pub fn file_size(&self) -> u64 {
        self.file_size.get()
    }

    pub fn error(&self) -> Option<FileRejected> {
        self.error.get()
    }

    /// The selected name, observable.
    pub fn file_name_signal(&self) -> Signal<Option<String>> {
        self.file_name.clone()
    }

    pub fn error_signal(&self) -> Signal<Option<FileRejected>> {
        self.error.clone()
    }
}

/// Remembers a [`FileInput`]; `options` are refreshed every pass.
pub fn use_file_input(options: FileInputOptions) -> Rc<FileInput> {
    let input = remember(|| FileInput::new(options.clone()));
    if *input.options.borrow() != options {
        input.set_options(options);
    }
    input
}

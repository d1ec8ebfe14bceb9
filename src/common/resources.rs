// Copyright 2025 The rust-seq2sum Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Resource definitions for model artifacts
//!
//! The crate consumes three kinds of artifacts: a SentencePiece model file, a
//! JSON model configuration and a `VarStore` weights file. Each is described
//! by a resource that resolves to a local path, either directly
//! (`LocalResource`) or through a cached download (`RemoteResource`).

use crate::common::error::SummarizerError;
use cached_path::{Cache, Options, ProgressBar};
use lazy_static::lazy_static;
use std::env;
use std::path::PathBuf;

/// # Resource Trait pointing to a local file path
pub trait ResourceProvider {
    /// Provides the local path for a resource, downloading it if necessary.
    fn get_local_path(&self) -> Result<PathBuf, SummarizerError>;
}

/// # Local resource
#[derive(PartialEq, Clone, Debug)]
pub struct LocalResource {
    /// Local path for the resource
    pub local_path: PathBuf,
}

impl ResourceProvider for LocalResource {
    fn get_local_path(&self) -> Result<PathBuf, SummarizerError> {
        Ok(self.local_path.clone())
    }
}

impl From<PathBuf> for LocalResource {
    fn from(local_path: PathBuf) -> Self {
        LocalResource { local_path }
    }
}

/// # Remote resource, fetched through the shared artifact cache
#[derive(PartialEq, Clone, Debug)]
pub struct RemoteResource {
    /// Remote URL for the resource
    pub url: String,
    /// Sub-directory of the cache root where the artifact is stored
    pub cache_subdir: String,
}

impl RemoteResource {
    /// Creates a new RemoteResource from an URL and a cache sub-directory.
    pub fn new(url: &str, cache_subdir: &str) -> RemoteResource {
        RemoteResource {
            url: url.to_string(),
            cache_subdir: cache_subdir.to_string(),
        }
    }

    /// Creates a new RemoteResource from a `(cache_subdir, url)` tuple.
    pub fn from_pretrained(name_url_tuple: (&str, &str)) -> RemoteResource {
        let cache_subdir = name_url_tuple.0.to_string();
        let url = name_url_tuple.1.to_string();
        RemoteResource { url, cache_subdir }
    }
}

impl ResourceProvider for RemoteResource {
    fn get_local_path(&self) -> Result<PathBuf, SummarizerError> {
        let cached_path = CACHE.cached_path_with_options(
            &self.url,
            &Options::default().subdir(&self.cache_subdir),
        )?;
        Ok(cached_path)
    }
}

lazy_static! {
    /// # Global cache directory
    ///
    /// Set by the `SEQ2SUM_CACHE` environment variable, defaulting to
    /// `~/.cache/.seq2sum`.
    pub static ref CACHE_DIRECTORY: PathBuf = _get_cache_directory();
    static ref CACHE: Cache = Cache::builder()
        .dir(CACHE_DIRECTORY.to_path_buf())
        .progress_bar(Some(ProgressBar::Light))
        .build()
        .expect("Could not create the artifact cache");
}

fn _get_cache_directory() -> PathBuf {
    match env::var("SEQ2SUM_CACHE") {
        Ok(value) => PathBuf::from(value),
        Err(_) => {
            let mut home = dirs::home_dir().expect("Could not locate user home directory");
            home.push(".cache");
            home.push(".seq2sum");
            home
        }
    }
}

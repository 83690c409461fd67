use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// One radio station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    pub name: String,
    pub address: String,
}

impl Stream {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Stations used when there is no streams file yet
const DEFAULT_STREAMS: &[(&str, &str)] = &[
    (
        "Yle Radio Suomi",
        "https://yleradiolive.akamaized.net/hls/live/2027675/in-YleRS/256/variant.m3u8",
    ),
    (
        "YleX",
        "https://yleradiolive.akamaized.net/hls/live/2027674/in-YleX/256/variant.m3u8",
    ),
];

/// The stream list, backed by a JSON file
#[derive(Debug, Clone)]
pub struct StreamList {
    path: PathBuf,
    streams: Vec<Stream>,
}

impl StreamList {
    /// Load the list from `path`, seeding the default stations if the file is missing
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            tracing::info!("No streams file at {}, using defaults", path.display());
            let streams = DEFAULT_STREAMS
                .iter()
                .map(|(name, address)| Stream::new(*name, *address))
                .collect();
            return Ok(Self { path, streams });
        }

        let file = File::open(&path)
            .with_context(|| format!("Could not open streams file {}", path.display()))?;
        let mut streams: Vec<Stream> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Malformed streams file {}", path.display()))?;

        // Buttons are labelled with the name's initial, so nameless entries can't be shown
        streams.retain(|s| {
            let keep = !s.name.is_empty() && !s.address.is_empty();
            if !keep {
                tracing::warn!("Skipping incomplete stream entry {:?}", s);
            }
            keep
        });

        tracing::debug!("Loaded {} streams from {}", streams.len(), path.display());
        Ok(Self { path, streams })
    }

    /// Write the list back to its file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }

        let file = File::create(&self.path)
            .with_context(|| format!("Could not write streams file {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.streams)?;
        writer.flush()?;

        tracing::debug!("Saved {} streams to {}", self.streams.len(), self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn get(&self, index: usize) -> Option<&Stream> {
        self.streams.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&Stream> {
        self.streams.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn push(&mut self, stream: Stream) {
        self.streams.push(stream);
    }

    /// Remove the stream at `index`, returning it
    pub fn remove(&mut self, index: usize) -> Option<Stream> {
        (index < self.streams.len()).then(|| self.streams.remove(index))
    }

    /// Append a stream and save; the list is left as it was if saving fails
    pub fn add(&mut self, stream: Stream) -> Result<()> {
        self.push(stream);
        if let Err(e) = self.save() {
            self.streams.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Remove the stream at `index` and save; `Ok(None)` if there is no such stream.
    /// The stream is put back if saving fails.
    pub fn delete(&mut self, index: usize) -> Result<Option<Stream>> {
        let Some(removed) = self.remove(index) else {
            return Ok(None);
        };

        if let Err(e) = self.save() {
            self.streams.insert(index, removed);
            return Err(e);
        }
        Ok(Some(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let list = StreamList::load(dir.path().join("streams.json")).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.streams()[1].name, "YleX");
        // Nothing is written until the list is saved
        assert!(!dir.path().join("streams.json").exists());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("streams.json");

        let mut list = StreamList::load(&path).unwrap();
        list.push(Stream::new("Radio Nova", "https://example.com/nova.m3u8"));
        list.save().unwrap();

        let reloaded = StreamList::load(&path).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(
            reloaded.find("Radio Nova").map(|s| s.address.as_str()),
            Some("https://example.com/nova.m3u8")
        );
    }

    #[test]
    fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streams.json");
        std::fs::write(
            &path,
            r#"[{ "name": "Jazz", "address": "http://jazz.example/stream" }]"#,
        )
        .unwrap();

        let list = StreamList::load(&path).unwrap();
        assert_eq!(list.streams(), &[Stream::new("Jazz", "http://jazz.example/stream")]);
    }

    #[test]
    fn test_blank_entries_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streams.json");
        std::fs::write(
            &path,
            r#"[
                { "name": "", "address": "http://nameless/stream" },
                { "name": "Silent", "address": "" },
                { "name": "Jazz", "address": "http://jazz.example/stream" }
            ]"#,
        )
        .unwrap();

        let list = StreamList::load(&path).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.streams()[0].name, "Jazz");
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streams.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(StreamList::load(&path).is_err());
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = StreamList::load(dir.path().join("streams.json")).unwrap();

        assert_eq!(list.remove(5), None);
        assert_eq!(list.remove(0).map(|s| s.name), Some("Yle Radio Suomi".to_string()));
        assert_eq!(list.len(), 1);
    }

    /// Streams file whose parent is a regular file, so every save fails
    fn unwritable_list(dir: &tempfile::TempDir) -> StreamList {
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        StreamList::load(blocker.join("streams.json")).unwrap()
    }

    #[test]
    fn test_add_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streams.json");
        let mut list = StreamList::load(&path).unwrap();

        list.add(Stream::new("Jazz", "http://jazz.example/stream")).unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(StreamList::load(&path).unwrap().streams(), list.streams());
    }

    #[test]
    fn test_failed_add_leaves_list_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = unwritable_list(&dir);
        let before = list.streams().to_vec();

        assert!(list.add(Stream::new("Jazz", "http://jazz.example/stream")).is_err());
        assert_eq!(list.streams(), before.as_slice());
    }

    #[test]
    fn test_failed_delete_puts_stream_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = unwritable_list(&dir);
        let before = list.streams().to_vec();

        assert!(list.delete(0).is_err());
        assert_eq!(list.streams(), before.as_slice());
        assert_eq!(list.delete(7).unwrap(), None);
    }
}

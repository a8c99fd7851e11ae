use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;

use crate::{
    error::Result,
    hey,
    twitch::models::{AccessToken, ClipSubject, FollowedAccount},
};

/// One persisted key. Each section is its own json file and its own lock, so
/// read-modify-write on one key never interleaves with another writer of the
/// same key.
pub struct Section<T> {
    path: Option<PathBuf>,
    value: Mutex<T>,
}

impl<T> Section<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + Send,
{
    fn open(dir: Option<&Path>, name: &str) -> Self {
        let path = dir.map(|d| d.join(format!("{}.json", name)));
        let value = path.as_deref().map(Self::load).unwrap_or_default();
        Self {
            path,
            value: Mutex::new(value),
        }
    }

    fn load(path: &Path) -> T {
        if !path.exists() {
            return T::default();
        }

        let Ok(data) = fs::read_to_string(path) else {
            hey!("Failed to read store file {}", path.display());
            return T::default();
        };

        match serde_json::from_str(data.as_str()) {
            Ok(v) => v,
            Err(e) => {
                hey!("Failed to deserialize store file {}: {}", path.display(), e);
                T::default()
            }
        }
    }

    fn write(&self, value: &T) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let data = serde_json::to_string(value)?;
        let mut file = OpenOptions::new()
            .read(false)
            .write(true)
            .create(true)
            .append(false)
            .truncate(true)
            .open(path)?;
        write!(file, "{}", data)?;
        Ok(())
    }

    pub async fn get(&self) -> T {
        self.value.lock().await.clone()
    }

    pub async fn set(&self, value: T) -> Result<()> {
        let mut guard = self.value.lock().await;
        self.write(&value)?;
        *guard = value;
        Ok(())
    }

    /// Runs `f` under the section lock and persists the result.
    pub async fn update<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut guard = self.value.lock().await;
        let out = f(&mut *guard);
        self.write(&*guard)?;
        Ok(out)
    }
}

pub struct Store {
    pub access_token: Section<Option<AccessToken>>,
    pub twitch_accounts: Section<Vec<FollowedAccount>>,
    pub twitch_clips: Section<BTreeMap<String, ClipSubject>>,
    /// discord user id -> twitch user id
    pub twitch_users: Section<BTreeMap<u64, String>>,
}

impl Store {
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(Self::build(Some(dir)))
    }

    /// A store that never touches the disk.
    pub fn in_memory() -> Self {
        Self::build(None)
    }

    fn build(dir: Option<&Path>) -> Self {
        Self {
            access_token: Section::open(dir, "access_token"),
            twitch_accounts: Section::open(dir, "twitch_accounts"),
            twitch_clips: Section::open(dir, "twitch_clips"),
            twitch_users: Section::open(dir, "twitch_users"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn account(id: &str) -> FollowedAccount {
        FollowedAccount {
            id: id.to_string(),
            display_name: id.to_string(),
            followers: vec![],
            channels: vec![1],
        }
    }

    #[tokio::test]
    async fn sections_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = Store::open(dir.path()).unwrap();
            store.twitch_accounts.set(vec![account("a")]).await.unwrap();
            store
                .twitch_users
                .update(|users| users.insert(7, "123".to_string()))
                .await
                .unwrap();
        }

        let store = Store::open(dir.path()).unwrap();
        let accounts = store.twitch_accounts.get().await;
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, "a");
        assert_eq!(store.twitch_users.get().await.get(&7).map(String::as_str), Some("123"));
        assert!(store.access_token.get().await.is_none());
    }

    #[tokio::test]
    async fn concurrent_updates_do_not_lose_writes() {
        let store = Arc::new(Store::in_memory());
        store.twitch_accounts.set(vec![account("a")]).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .twitch_accounts
                    .update(|accounts| accounts[0].followers.push(format!("u{}", i)))
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.twitch_accounts.get().await[0].followers.len(), 50);
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("twitch_clips.json"), "{{{").unwrap();

        let store = Store::open(dir.path()).unwrap();
        assert!(store.twitch_clips.get().await.is_empty());
    }
}

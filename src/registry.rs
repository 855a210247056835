//! The persisted list of subscribers.

use std::{
    fmt, io, iter,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::sync::Mutex;
use tracing::Instrument as _;

use crate::domain::SubscriberEmail;

/// Subscriber addresses in insertion order, mirrored to a newline-separated text file.
///
/// One lock guards both the in-memory list and writes to the file, so a subscribe racing with
/// another subscribe or a broadcast never loses an update or interleaves a write.
#[derive(Debug)]
pub struct SubscriberRegistry {
    path: PathBuf,
    subscribers: Arc<Mutex<Vec<SubscriberEmail>>>,
}

impl SubscriberRegistry {
    /// Loads the registry stored at `path`. A missing file is an empty registry.
    #[tracing::instrument]
    pub async fn load(path: PathBuf) -> Result<Self, Error> {
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                tracing::info!("no subscribers stored yet");
                String::new()
            }
            Err(error) => return Err(Error::Storage { path, error }),
        };

        let subscribers = parse(&content);
        tracing::info!(count = subscribers.len(), "loaded subscribers");

        Ok(Self {
            path,
            subscribers: Arc::new(Mutex::new(subscribers)),
        })
    }

    /// Adds `email` unless it is invalid or already present, then persists the registry.
    ///
    /// The address is only kept once the store holds it. Once the lock is taken, the write runs
    /// to completion on its own task even if the returned future is dropped.
    #[tracing::instrument(skip(self))]
    pub async fn subscribe(&self, email: &str) -> Result<(), Error> {
        let email = SubscriberEmail::parse(email)
            .map_err(|error| Error::InvalidEmail(error.to_string()))?;

        let mut subscribers = Arc::clone(&self.subscribers).lock_owned().await;
        if subscribers.contains(&email) {
            return Err(Error::DuplicateSubscriber(email));
        }

        let path = self.path.clone();
        let persist = tokio::spawn(
            async move {
                write(&path, subscribers.iter().chain(iter::once(&email))).await?;
                subscribers.push(email);
                Ok::<_, Error>(subscribers.len())
            }
            .in_current_span(),
        );

        let count = persist.await.map_err(|error| Error::Storage {
            path: self.path.clone(),
            error: io::Error::new(io::ErrorKind::Other, error.to_string()),
        })??;

        tracing::info!(count, "subscriber added");
        Ok(())
    }

    /// A snapshot of the current subscribers.
    pub async fn all(&self) -> Vec<SubscriberEmail> {
        self.subscribers.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Rewrites the store with the current subscribers.
    pub async fn save(&self) -> Result<(), Error> {
        let subscribers = self.subscribers.lock().await;
        write(&self.path, subscribers.iter()).await
    }
}

fn parse(content: &str) -> Vec<SubscriberEmail> {
    let mut subscribers: Vec<SubscriberEmail> = Vec::new();

    for line in content.lines().filter(|line| !line.trim().is_empty()) {
        match SubscriberEmail::parse(line) {
            Ok(email) if subscribers.contains(&email) => {
                tracing::warn!(%email, "skipping duplicate stored subscriber");
            }
            Ok(email) => subscribers.push(email),
            Err(error) => tracing::warn!(%error, "skipping invalid stored subscriber"),
        }
    }

    subscribers
}

// Writes a sibling file first so a failed write never truncates the existing store.
async fn write<'a>(
    path: &Path,
    subscribers: impl Iterator<Item = &'a SubscriberEmail>,
) -> Result<(), Error> {
    let content = subscribers
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join("\n");

    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    let storage_error = |error| Error::Storage {
        path: path.to_owned(),
        error,
    };
    tokio::fs::write(&staging, content)
        .await
        .map_err(storage_error)?;
    tokio::fs::rename(&staging, path)
        .await
        .map_err(storage_error)
}

#[derive(Debug)]
pub enum Error {
    InvalidEmail(String),
    DuplicateSubscriber(SubscriberEmail),
    Storage { path: PathBuf, error: io::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail(error) => write!(f, "{}", error),
            Self::DuplicateSubscriber(email) => write!(f, "{} is already subscribed", email),
            Self::Storage { path, .. } => {
                write!(f, "failed to access subscribers at {}", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage { error, .. } => Some(error),
            _ => None,
        }
    }
}

use async_trait::async_trait;

use crate::error::SendError;

/// An image read from disk, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Photo {
    pub(crate) file_name: String,
    pub(crate) bytes: Vec<u8>,
}

/// The wire calls a messaging platform has to provide.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait PlatformApi: Send + Sync {
    /// Check the credentials before a batch starts.
    async fn open(&self) -> Result<(), SendError>;

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), SendError>;

    /// Upload `photo`; an empty caption is sent without one.
    async fn send_photo(&self, chat_id: &str, photo: &Photo, caption: &str)
        -> Result<(), SendError>;

    /// End of a batch. Called on every exit path once `open` was attempted.
    async fn close(&self);
}

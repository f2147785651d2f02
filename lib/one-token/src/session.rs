//! Token entry point and sessions.
//!
//! Objects created through a session with `Token = false` belong to that
//! session and are destroyed when it is closed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use one_crypto::CryptoProvider;
use tokio::sync::Mutex;

use crate::config::TokenConfig;
use crate::error::TokenError;
use crate::model::attribute::{Attribute, AttributeType, Template};
use crate::model::handle::{ObjectHandle, SessionHandle};
use crate::model::mechanism::Mechanism;
use crate::model::padding::PaddingConvention;
use crate::store::{GeneratedKeyPair, ObjectStore, ObjectStoreImpl};


pub struct Token {
    store: Arc<dyn ObjectStore>,
    next_session: AtomicU64,
}

impl Token {
    pub fn new(config: TokenConfig, crypto: Arc<dyn CryptoProvider>) -> Self {
        Self::with_store(Arc::new(ObjectStoreImpl::new(config.store, crypto)))
    }

    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            next_session: AtomicU64::new(1),
        }
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    pub fn open_session(&self) -> Session {
        let handle = SessionHandle(self.next_session.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(session = %handle, "session opened");

        Session {
            handle,
            store: self.store.clone(),
            session_objects: Mutex::new(Vec::new()),
        }
    }
}

/// Call [`Session::close`] when done. A session that is only dropped leaves its
/// session objects in the store and logs a warning.
pub struct Session {
    handle: SessionHandle,
    store: Arc<dyn ObjectStore>,
    session_objects: Mutex<Vec<ObjectHandle>>,
}

fn is_session_object(template: &Template) -> bool {
    !template.flag(AttributeType::Token).unwrap_or(false)
}

impl Session {
    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    async fn track(&self, template: &Template, handle: ObjectHandle) {
        if is_session_object(template) {
            self.session_objects.lock().await.push(handle);
        }
    }

    pub async fn import_object(&self, template: &Template) -> Result<ObjectHandle, TokenError> {
        let handle = self.store.import_object(template).await?;
        self.track(template, handle).await;
        Ok(handle)
    }

    pub async fn import_object_with_padding(
        &self,
        template: &Template,
        padding: PaddingConvention,
    ) -> Result<ObjectHandle, TokenError> {
        let handle = self
            .store
            .import_object_with_padding(template, padding)
            .await?;
        self.track(template, handle).await;
        Ok(handle)
    }

    pub async fn generate_key_pair(
        &self,
        mechanism: Mechanism,
        public_template: &Template,
        private_template: &Template,
    ) -> Result<GeneratedKeyPair, TokenError> {
        let key_pair = self
            .store
            .generate_key_pair(mechanism, public_template, private_template)
            .await?;
        self.track(public_template, key_pair.public_key).await;
        self.track(private_template, key_pair.private_key).await;
        Ok(key_pair)
    }

    pub async fn export_public_key(&self, handle: ObjectHandle) -> Result<Vec<u8>, TokenError> {
        self.store.export_public_key(handle).await
    }

    pub async fn get_attribute_value(
        &self,
        handle: ObjectHandle,
        attribute_types: &[AttributeType],
    ) -> Result<Vec<Attribute>, TokenError> {
        self.store.get_attribute_value(handle, attribute_types).await
    }

    pub async fn set_attribute_value(
        &self,
        handle: ObjectHandle,
        template: &Template,
    ) -> Result<(), TokenError> {
        self.store.set_attribute_value(handle, template).await
    }

    pub async fn find_objects(&self, template: &Template) -> Vec<ObjectHandle> {
        self.store.find_objects(template).await
    }

    pub async fn destroy_object(&self, handle: ObjectHandle) -> Result<(), TokenError> {
        self.store.destroy_object(handle).await?;
        self.session_objects
            .lock()
            .await
            .retain(|session_object| *session_object != handle);
        Ok(())
    }

    /// Destroys the objects owned by this session. Token objects survive.
    #[tracing::instrument(level = "debug", skip(self), fields(session = %self.handle), err(Debug))]
    pub async fn close(mut self) -> Result<(), TokenError> {
        let session_objects = std::mem::take(self.session_objects.get_mut());

        for handle in &session_objects {
            match self.store.destroy_object(*handle).await {
                Ok(()) | Err(TokenError::HandleNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }

        tracing::debug!(destroyed = session_objects.len(), "session closed");
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let left_behind = self.session_objects.get_mut();
        if !left_behind.is_empty() {
            tracing::warn!(
                session = %self.handle,
                objects = left_behind.len(),
                "session dropped without close, session objects remain in the store"
            );
        }
    }
}

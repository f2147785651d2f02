//! Handle-addressed object table with import, generation, export and search.

use std::collections::HashMap;
use std::sync::Arc;

use one_crypto::CryptoProvider;
use one_crypto::model::PublicKeyComponents;
use secrecy::ExposeSecret;
use tokio::sync::Mutex;

use crate::config::StoreConfig;
use crate::error::TokenError;
use crate::model::attribute::{Attribute, AttributeType, ObjectClass, Template};
use crate::model::handle::{HandleAllocator, ObjectHandle};
use crate::model::mechanism::Mechanism;
use crate::model::object::{KeyMaterial, KeyObject};
use crate::model::padding::PaddingConvention;
use crate::store::validation::{
    KeyPairAttributes, KeyPairRequest, RsaFields, ec_private_material, ec_public_material,
    import_object, key_pair_request, rsa_private_material, rsa_public_material,
};

pub(crate) mod validation;


#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GeneratedKeyPair {
    pub public_key: ObjectHandle,
    pub private_key: ObjectHandle,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Imports a key object using the configured padding convention.
    async fn import_object(&self, template: &Template) -> Result<ObjectHandle, TokenError>;

    async fn import_object_with_padding(
        &self,
        template: &Template,
        padding: PaddingConvention,
    ) -> Result<ObjectHandle, TokenError>;

    /// Generates a key pair; either both objects are stored or neither is.
    async fn generate_key_pair(
        &self,
        mechanism: Mechanism,
        public_template: &Template,
        private_template: &Template,
    ) -> Result<GeneratedKeyPair, TokenError>;

    /// DER SubjectPublicKeyInfo of a public key object.
    async fn export_public_key(&self, handle: ObjectHandle) -> Result<Vec<u8>, TokenError>;

    /// Returns the requested attributes in request order.
    async fn get_attribute_value(
        &self,
        handle: ObjectHandle,
        attribute_types: &[AttributeType],
    ) -> Result<Vec<Attribute>, TokenError>;

    async fn set_attribute_value(
        &self,
        handle: ObjectHandle,
        template: &Template,
    ) -> Result<(), TokenError>;

    /// Handles of all objects matching `template`, in ascending order.
    async fn find_objects(&self, template: &Template) -> Vec<ObjectHandle>;

    async fn destroy_object(&self, handle: ObjectHandle) -> Result<(), TokenError>;

    async fn object_count(&self) -> usize;
}

#[derive(Debug, Default)]
struct StoreState {
    objects: HashMap<ObjectHandle, KeyObject>,
    handles: HandleAllocator,
}

impl StoreState {
    fn get(&self, handle: ObjectHandle) -> Result<&KeyObject, TokenError> {
        self.objects
            .get(&handle)
            .ok_or(TokenError::HandleNotFound(handle))
    }

    fn insert(&mut self, object: KeyObject) -> ObjectHandle {
        let handle = self.handles.allocate();
        self.objects.insert(handle, object);
        handle
    }

    /// Labels are unique per object class; empty labels are exempt.
    fn ensure_label_available(
        &self,
        class: ObjectClass,
        label: &[u8],
        owner: Option<ObjectHandle>,
    ) -> Result<(), TokenError> {
        if label.is_empty() {
            return Ok(());
        }

        let taken = self.objects.iter().any(|(handle, object)| {
            Some(*handle) != owner && object.class() == class && object.label() == label
        });

        if taken {
            let label = String::from_utf8_lossy(label).into_owned();
            tracing::warn!(%label, %class, "label already in use");
            return Err(TokenError::DuplicateLabel(label));
        }

        Ok(())
    }
}

pub struct ObjectStoreImpl {
    config: StoreConfig,
    crypto: Arc<dyn CryptoProvider>,
    state: Mutex<StoreState>,
}

impl ObjectStoreImpl {
    pub fn new(config: StoreConfig, crypto: Arc<dyn CryptoProvider>) -> Self {
        Self {
            config,
            crypto,
            state: Mutex::new(StoreState::default()),
        }
    }

    fn check_label(
        &self,
        state: &StoreState,
        class: ObjectClass,
        label: &[u8],
        owner: Option<ObjectHandle>,
    ) -> Result<(), TokenError> {
        if !self.config.unique_labels {
            return Ok(());
        }

        state.ensure_label_available(class, label, owner)
    }

    /// Public key objects must be exportable, so their material is checked by the provider.
    fn ensure_encodable(&self, object: &KeyObject) -> Result<(), TokenError> {
        let Some(public_key) = object.public_key_components() else {
            return Ok(());
        };

        self.crypto.validate_public_key(&public_key).map_err(|err| {
            tracing::warn!(%err, "rejected public key material");
            match public_key {
                PublicKeyComponents::Rsa(_) => {
                    TokenError::InvalidAttributeValue(AttributeType::PublicExponent)
                }
                PublicKeyComponents::Ec { .. } => {
                    TokenError::InvalidAttributeValue(AttributeType::EcPoint)
                }
            }
        })
    }

    /// Builds both objects from provider output, applying the same checks as an import.
    fn generate_objects(
        &self,
        request: &KeyPairRequest,
        attributes: KeyPairAttributes,
    ) -> Result<(KeyObject, KeyObject), TokenError> {
        let (public_material, private_material) = match request {
            KeyPairRequest::Rsa {
                modulus_bits,
                public_exponent,
            } => {
                let pair = self
                    .crypto
                    .generate_rsa_key_pair(*modulus_bits as usize, public_exponent)?;

                let build = || {
                    let public = rsa_public_material(
                        &pair.public.modulus,
                        &pair.public.public_exponent,
                        Some(*modulus_bits),
                        PaddingConvention::Exact,
                        &self.config,
                    )?;
                    let private = &pair.private;
                    let private = rsa_private_material(
                        &RsaFields {
                            modulus: &private.modulus,
                            public_exponent: &private.public_exponent,
                            private_exponent: private.private_exponent.expose_secret(),
                            prime_1: private.prime_1.expose_secret(),
                            prime_2: private.prime_2.expose_secret(),
                            exponent_1: private.exponent_1.expose_secret(),
                            exponent_2: private.exponent_2.expose_secret(),
                            coefficient: private.coefficient.expose_secret(),
                        },
                        Some(*modulus_bits),
                        PaddingConvention::Exact,
                        &self.config,
                    )?;
                    Ok::<_, TokenError>((public, private))
                };

                build().map_err(|err| TokenError::PartialPairFailure(Box::new(err)))?
            }
            KeyPairRequest::Ec { curve } => {
                let pair = self.crypto.generate_ec_key_pair(*curve)?;
                let ec_params = curve.ec_params();

                let build = || {
                    let public = ec_public_material(ec_params, &pair.point, &self.config)?;
                    let private = ec_private_material(
                        ec_params,
                        pair.scalar.expose_secret(),
                        PaddingConvention::Exact,
                        &self.config,
                    )?;
                    Ok::<_, TokenError>((public, private))
                };

                build().map_err(|err| TokenError::PartialPairFailure(Box::new(err)))?
            }
        };

        let partial = |err| TokenError::PartialPairFailure(Box::new(err));
        let public = KeyObject::new(attributes.public, public_material).map_err(partial)?;
        let private = KeyObject::new(attributes.private, private_material).map_err(partial)?;

        Ok((public, private))
    }
}

fn material_kind(material: &KeyMaterial) -> &'static str {
    match material {
        KeyMaterial::RsaPublic { .. } => "RSA public key",
        KeyMaterial::RsaPrivate { .. } => "RSA private key",
        KeyMaterial::EcPublic { .. } => "EC public key",
        KeyMaterial::EcPrivate { .. } => "EC private key",
    }
}

#[async_trait::async_trait]
impl ObjectStore for ObjectStoreImpl {
    async fn import_object(&self, template: &Template) -> Result<ObjectHandle, TokenError> {
        self.import_object_with_padding(template, self.config.padding)
            .await
    }

    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    async fn import_object_with_padding(
        &self,
        template: &Template,
        padding: PaddingConvention,
    ) -> Result<ObjectHandle, TokenError> {
        let object = import_object(template, padding, &self.config)?;
        self.ensure_encodable(&object)?;

        let mut state = self.state.lock().await;
        self.check_label(&state, object.class(), object.label(), None)?;

        let kind = material_kind(object.material());
        let handle = state.insert(object);
        tracing::debug!(%handle, kind, "object imported");

        Ok(handle)
    }

    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    async fn generate_key_pair(
        &self,
        mechanism: Mechanism,
        public_template: &Template,
        private_template: &Template,
    ) -> Result<GeneratedKeyPair, TokenError> {
        let (request, attributes) =
            key_pair_request(mechanism, public_template, private_template, &self.config)?;

        {
            let state = self.state.lock().await;
            self.check_label(&state, ObjectClass::PublicKey, &attributes.public.label, None)?;
            self.check_label(&state, ObjectClass::PrivateKey, &attributes.private.label, None)?;
        }

        let (public, private) = self.generate_objects(&request, attributes)?;

        let mut state = self.state.lock().await;
        self.check_label(&state, public.class(), public.label(), None)?;
        self.check_label(&state, private.class(), private.label(), None)?;

        let key_pair = GeneratedKeyPair {
            public_key: state.insert(public),
            private_key: state.insert(private),
        };
        tracing::debug!(
            public_key = %key_pair.public_key,
            private_key = %key_pair.private_key,
            %mechanism,
            "key pair generated"
        );

        Ok(key_pair)
    }

    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    async fn export_public_key(&self, handle: ObjectHandle) -> Result<Vec<u8>, TokenError> {
        let public_key = {
            let state = self.state.lock().await;
            let object = state.get(handle)?;
            object
                .public_key_components()
                .ok_or(TokenError::WrongObjectClass {
                    handle,
                    class: object.class(),
                })?
        };

        Ok(self.crypto.encode_public_key_der(&public_key)?)
    }

    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    async fn get_attribute_value(
        &self,
        handle: ObjectHandle,
        attribute_types: &[AttributeType],
    ) -> Result<Vec<Attribute>, TokenError> {
        let state = self.state.lock().await;
        let object = state.get(handle)?;

        attribute_types
            .iter()
            .map(|attribute_type| object.attribute(*attribute_type))
            .collect()
    }

    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    async fn set_attribute_value(
        &self,
        handle: ObjectHandle,
        template: &Template,
    ) -> Result<(), TokenError> {
        template.ensure_consistent()?;

        let mut state = self.state.lock().await;
        let mut updated = state.get(handle)?.clone();
        for attribute in template {
            updated.apply(attribute)?;
        }

        if template.contains(AttributeType::Label) {
            self.check_label(&state, updated.class(), updated.label(), Some(handle))?;
        }

        state.objects.insert(handle, updated);
        tracing::debug!(%handle, "attributes updated");

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_objects(&self, template: &Template) -> Vec<ObjectHandle> {
        let state = self.state.lock().await;

        let mut handles: Vec<ObjectHandle> = state
            .objects
            .iter()
            .filter(|(_, object)| object.matches(template))
            .map(|(handle, _)| *handle)
            .collect();
        handles.sort();

        handles
    }

    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    async fn destroy_object(&self, handle: ObjectHandle) -> Result<(), TokenError> {
        let mut state = self.state.lock().await;
        state
            .objects
            .remove(&handle)
            .ok_or(TokenError::HandleNotFound(handle))?;

        tracing::debug!(%handle, "object destroyed");
        Ok(())
    }

    async fn object_count(&self) -> usize {
        self.state.lock().await.objects.len()
    }
}

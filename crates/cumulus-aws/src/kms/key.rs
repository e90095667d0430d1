//! KMS key cloud object
//!
//! A key's identity is its alias, derived from the owning resource's logical
//! name. Raw key ids are random on the provider side, so the alias is the only
//! handle that can be recomputed; losing it makes the key invisible to every
//! future existence check.

use crate::api::{KmsApi, codes};
use crate::kms::types::{CreateKey, KeyMetadata, KmsTag};
use crate::kms::{KEY_DELETION_WINDOW_DAYS, KMS_KEY_TOPIC};
use crate::validate_name;
use async_trait::async_trait;
use cumulus_cloud::{CloudObject, Id, ObjectError, ObjectSpec, Result, Secrets};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// What the key may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyUsage {
    #[default]
    EncryptDecrypt,
    SignVerify,
}

impl KeyUsage {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyUsage::EncryptDecrypt => "ENCRYPT_DECRYPT",
            KeyUsage::SignVerify => "SIGN_VERIFY",
        }
    }
}

impl FromStr for KeyUsage {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ENCRYPT_DECRYPT" => Ok(KeyUsage::EncryptDecrypt),
            "SIGN_VERIFY" => Ok(KeyUsage::SignVerify),
            other => Err(ObjectError::OptsInvalid(format!("unknown key usage '{other}'"))),
        }
    }
}

/// Key material type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyType {
    #[default]
    SymmetricDefault,
    Rsa2048,
    Rsa3072,
    Rsa4096,
    NistP256,
    NistP521,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::SymmetricDefault => "SYMMETRIC_DEFAULT",
            KeyType::Rsa2048 => "RSA_2048",
            KeyType::Rsa3072 => "RSA_3072",
            KeyType::Rsa4096 => "RSA_4096",
            KeyType::NistP256 => "ECC_NIST_P256",
            KeyType::NistP521 => "ECC_NIST_P521",
        }
    }
}

impl FromStr for KeyType {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SYMMETRIC_DEFAULT" => Ok(KeyType::SymmetricDefault),
            "RSA_2048" => Ok(KeyType::Rsa2048),
            "RSA_3072" => Ok(KeyType::Rsa3072),
            "RSA_4096" => Ok(KeyType::Rsa4096),
            "ECC_NIST_P256" => Ok(KeyType::NistP256),
            "ECC_NIST_P521" => Ok(KeyType::NistP521),
            other => Err(ObjectError::OptsInvalid(format!("unknown key type '{other}'"))),
        }
    }
}

/// Desired state for a key.
#[derive(Debug, Clone, Default)]
pub struct KeySpec {
    pub usage: KeyUsage,
    pub key_type: KeyType,
    pub policy: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl ObjectSpec for KeySpec {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl KeySpec {
    pub(crate) fn create_input(&self) -> CreateKey {
        CreateKey {
            key_spec: self.key_type.as_str().to_string(),
            key_usage: self.usage.as_str().to_string(),
            policy: self.policy.clone(),
            description: None,
            tags: self
                .tags
                .iter()
                .map(|(k, v)| KmsTag {
                    tag_key: k.clone(),
                    tag_value: v.clone(),
                })
                .collect(),
        }
    }
}

/// Last-observed key state, decoupled from the wire schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStatus {
    pub key_id: String,
    pub arn: Option<String>,
    pub state: Option<String>,
    pub enabled: bool,
}

impl From<KeyMetadata> for KeyStatus {
    fn from(meta: KeyMetadata) -> Self {
        Self {
            key_id: meta.key_id,
            arn: meta.arn,
            state: meta.key_state,
            enabled: meta.enabled,
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key {} state={} enabled={}",
            self.key_id,
            self.state.as_deref().unwrap_or("unknown"),
            self.enabled
        )
    }
}

/// KMS key handle.
pub struct Key<C> {
    name: String,
    status: Option<KeyStatus>,
    client: C,
}

impl<C> Key<C>
where
    C: KmsApi + Clone + Send + Sync,
{
    pub fn new(name: impl Into<String>, client: C) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            status: None,
            client,
        })
    }
}

#[async_trait]
impl<C> CloudObject for Key<C>
where
    C: KmsApi + Clone + Send + Sync,
{
    type Spec = KeySpec;
    type Status = KeyStatus;

    async fn create(&mut self, spec: &KeySpec) -> Result<Option<Secrets>> {
        if self.exists().await? {
            return Ok(None);
        }

        let metadata = self.client.create_key(spec.create_input()).await?;

        // The alias is bound in a second call. If that call fails the fresh
        // key would be stranded unaliased and invisible to existence checks,
        // so schedule it for deletion before surfacing the failure.
        if let Err(err) = self.client.create_alias(self.id().as_str(), &metadata.key_id).await {
            if let Err(cleanup) = self
                .client
                .schedule_key_deletion(&metadata.key_id, KEY_DELETION_WINDOW_DAYS)
                .await
            {
                tracing::warn!(
                    key_id = %metadata.key_id,
                    error = %cleanup,
                    "failed to schedule deletion of unaliased key"
                );
            }
            return Err(err.into());
        }

        self.read().await?;

        Ok(None)
    }

    async fn read(&mut self) -> Result<()> {
        let metadata = match self.client.describe_key(self.id().as_str()).await {
            Ok(metadata) => metadata,
            Err(e) if e.is_code(codes::KMS_NOT_FOUND) => {
                return Err(ObjectError::NotExists(format!(
                    "KMS key with id '{}' not found",
                    self.id()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        self.status = Some(metadata.into());

        Ok(())
    }

    async fn update(&mut self, _spec: &KeySpec) -> Result<Option<Secrets>> {
        // Nothing on the key itself is mutable; refresh status and return.
        self.read().await?;
        Ok(None)
    }

    async fn delete(&mut self, purge: bool) -> Result<()> {
        // Without the alias there is no way back to the key id, so an absent
        // key leaves nothing to do.
        if !self.exists().await? {
            return Ok(());
        }
        let key_id = match &self.status {
            Some(status) => status.key_id.clone(),
            None => {
                return Err(ObjectError::NotExists(format!(
                    "KMS key with id '{}' not found",
                    self.id()
                )));
            }
        };

        self.client.disable_key(&key_id).await?;

        // Keys cannot be deleted instantly, only scheduled.
        if purge {
            self.client
                .schedule_key_deletion(&key_id, KEY_DELETION_WINDOW_DAYS)
                .await?;
        }

        // Drop the alias unconditionally so the name becomes reusable.
        match self.client.delete_alias(self.id().as_str()).await {
            Ok(()) => {}
            Err(e) if e.is_code(codes::KMS_NOT_FOUND) => {}
            Err(e) => return Err(e.into()),
        }

        self.status = None;

        Ok(())
    }

    fn id(&self) -> Id {
        Id::raw(format!("alias/{}", Id::derive(KMS_KEY_TOPIC, &self.name)))
    }

    fn status(&self) -> Option<&KeyStatus> {
        self.status.as_ref()
    }
}

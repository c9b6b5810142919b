use crate::config::UserConfig;
use crate::domain::principal::Principal;
use crate::error::{Result, ShopError};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

struct Credential {
    digest: [u8; 32],
    principal: Principal,
}

/// Resolves bearer tokens to principals.
///
/// Only SHA-256 digests of tokens are held. Lookups compare the presented
/// digest against every credential in constant time and never short-circuit.
pub struct TokenAuthenticator {
    credentials: Vec<Credential>,
}

impl TokenAuthenticator {
    pub fn from_users(users: &[UserConfig]) -> Result<Self> {
        let credentials = users
            .iter()
            .map(|user| {
                Ok(Credential {
                    digest: user.digest()?,
                    principal: Principal::new(user.id.clone(), user.role),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { credentials })
    }

    pub fn authenticate(&self, token: &str) -> Result<Principal> {
        let presented: [u8; 32] = Sha256::digest(token.as_bytes()).into();
        let mut found = None;
        for credential in &self.credentials {
            if bool::from(credential.digest[..].ct_eq(&presented[..])) {
                found = Some(&credential.principal);
            }
        }
        found.cloned().ok_or(ShopError::Unauthorized)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

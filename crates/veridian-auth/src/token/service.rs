//! Token creation.
//!
//! Builds identity and access token entities from a
//! [`TokenCreationRequest`], and materializes them as signed JWTs or stored
//! reference handles.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::claims::ClaimsProvider;
use crate::config::AuthConfig;
use crate::crypto;
use crate::error::AuthError;
use crate::events::{Event, EventSink};
use crate::storage::TokenHandleStore;
use crate::token::signing::TokenSigningService;
use crate::types::claims::{claim_types, dedup_claims};
use crate::types::{AccessTokenType, Claim, Client, Token, TokenCreationRequest, TokenType};
use crate::AuthResult;

/// Token schema version stamped into new tokens.
const TOKEN_VERSION: u32 = 4;

/// Creates token entities and turns them into wire strings.
pub struct TokenService {
    claims: Arc<dyn ClaimsProvider>,
    signer: TokenSigningService,
    handles: Arc<dyn TokenHandleStore>,
    events: Arc<dyn EventSink>,
    config: Arc<AuthConfig>,
}

impl TokenService {
    /// Creates a token service.
    #[must_use]
    pub fn new(
        claims: Arc<dyn ClaimsProvider>,
        signer: TokenSigningService,
        handles: Arc<dyn TokenHandleStore>,
        events: Arc<dyn EventSink>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            claims,
            signer,
            handles,
            events,
            config,
        }
    }

    /// Builds an identity token entity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] when the request carries no subject,
    /// and propagates claims provider failures.
    pub async fn create_identity_token(
        &self,
        request: &TokenCreationRequest,
    ) -> AuthResult<Token> {
        let subject = request
            .subject
            .as_ref()
            .ok_or_else(|| AuthError::internal("identity token requires a subject"))?;

        let now = OffsetDateTime::now_utc();
        let mut claims = vec![Claim::integer(claim_types::ISSUED_AT, now.unix_timestamp())];

        if let Some(nonce) = &request.nonce {
            claims.push(Claim::string(claim_types::NONCE, nonce));
        }
        if let Some(sid) = &request.session_id {
            claims.push(Claim::string(claim_types::SESSION_ID, sid));
        }
        // Half-hash bindings to sibling artifacts of the same response.
        if let Some(access_token) = &request.access_token_to_hash {
            claims.push(Claim::string(
                claim_types::ACCESS_TOKEN_HASH,
                crypto::oidc_token_hash(access_token),
            ));
        }
        if let Some(code) = &request.authorization_code_to_hash {
            claims.push(Claim::string(
                claim_types::AUTHORIZATION_CODE_HASH,
                crypto::oidc_token_hash(code),
            ));
        }

        claims.extend(
            self.claims
                .claims_for_identity_token(
                    subject,
                    &request.client,
                    &request.scopes,
                    request.include_all_identity_claims,
                )
                .await?,
        );

        Ok(Token {
            token_type: TokenType::Identity,
            audience: request.client.client_id.clone(),
            issuer: self.config.issuer.clone(),
            created_at: now,
            lifetime: request.client.identity_token_lifetime,
            claims: dedup_claims(claims),
            client_id: request.client.client_id.clone(),
            version: TOKEN_VERSION,
        })
    }

    /// Builds an access token entity.
    ///
    /// # Errors
    ///
    /// Propagates claims provider failures.
    pub async fn create_access_token(&self, request: &TokenCreationRequest) -> AuthResult<Token> {
        let mut claims = self
            .claims
            .claims_for_access_token(request.subject.as_ref(), &request.client, &request.scopes)
            .await?;

        if request.client.include_jwt_id {
            claims.push(Claim::string(
                claim_types::JWT_ID,
                uuid::Uuid::new_v4().to_string(),
            ));
        }
        if let Some(proof_key) = &request.proof_key {
            claims.push(Claim::json(
                claim_types::CONFIRMATION,
                serde_json::json!({ "jkt": proof_key }),
            ));
        }

        Ok(Token {
            token_type: TokenType::Access,
            audience: self.config.access_token_audience(),
            issuer: self.config.issuer.clone(),
            created_at: OffsetDateTime::now_utc(),
            lifetime: request.client.access_token_lifetime,
            claims: dedup_claims(claims),
            client_id: request.client.client_id.clone(),
            version: TOKEN_VERSION,
        })
    }

    /// Materializes a token entity as its wire form.
    ///
    /// Identity tokens and JWT access tokens are signed; reference access
    /// tokens are stored and their handle returned.
    ///
    /// # Errors
    ///
    /// Propagates signing and storage failures.
    pub async fn create_security_token(
        &self,
        token: Token,
        client: &Client,
    ) -> AuthResult<String> {
        let token_type = token.token_type;
        let client_id = token.client_id.clone();

        let value = match token.token_type {
            TokenType::Identity => self.signer.sign(&token)?,
            TokenType::Access => match client.access_token_type {
                AccessTokenType::Jwt => self.signer.sign(&token)?,
                AccessTokenType::Reference => {
                    let handle = crypto::generate_handle();
                    self.handles.store(&handle, token).await?;
                    handle
                }
            },
        };

        self.events
            .raise(Event::TokenIssued {
                token_type: token_type.as_str().to_string(),
                client_id,
            })
            .await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::DefaultClaimsProvider;
    use crate::events::EventSink;
    use crate::storage::UserService;
    use crate::token::signing::InMemorySigningKeyService;
    use crate::types::{Scope, Subject};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    struct MockUserService;

    #[async_trait]
    impl UserService for MockUserService {
        async fn claims_for_subject(
            &self,
            _subject: &Subject,
            _requested: Option<&[String]>,
        ) -> AuthResult<Vec<Claim>> {
            Ok(vec![])
        }

        async fn is_active(&self, _subject_id: &str) -> AuthResult<bool> {
            Ok(true)
        }

        async fn authenticate_local(
            &self,
            _username: &str,
            _password: &str,
        ) -> AuthResult<Option<Subject>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct MockHandleStore {
        tokens: RwLock<HashMap<String, Token>>,
    }

    #[async_trait]
    impl TokenHandleStore for MockHandleStore {
        async fn store(&self, handle: &str, token: Token) -> AuthResult<()> {
            self.tokens.write().await.insert(handle.to_string(), token);
            Ok(())
        }

        async fn get(&self, handle: &str) -> AuthResult<Option<Token>> {
            Ok(self.tokens.read().await.get(handle).cloned())
        }

        async fn remove(&self, handle: &str) -> AuthResult<()> {
            self.tokens.write().await.remove(handle);
            Ok(())
        }
    }

    struct NullSink;

    #[async_trait]
    impl EventSink for NullSink {
        async fn raise(&self, _event: Event) {}
    }

    fn service(handles: Arc<MockHandleStore>) -> TokenService {
        let keys = Arc::new(InMemorySigningKeyService::generate().unwrap());
        TokenService::new(
            Arc::new(DefaultClaimsProvider::new(Arc::new(MockUserService))),
            TokenSigningService::new(keys),
            handles,
            Arc::new(NullSink),
            Arc::new(AuthConfig::default()),
        )
    }

    fn creation_request() -> TokenCreationRequest {
        TokenCreationRequest::new(
            Client::new("app"),
            vec![Scope::open_id(), Scope::resource("api1")],
        )
        .with_subject(Subject::new("123"))
    }

    #[tokio::test]
    async fn test_identity_token_carries_nonce_and_hashes() {
        let service = service(Arc::new(MockHandleStore::default()));
        let mut request = creation_request().with_nonce("n-0S6_WzA2Mj");
        request.access_token_to_hash = Some("the-access-token".to_string());

        let token = service.create_identity_token(&request).await.unwrap();
        assert_eq!(token.token_type, TokenType::Identity);
        assert_eq!(token.audience, "app");
        assert_eq!(token.lifetime, 300);
        assert!(token
            .claims
            .iter()
            .any(|c| c.claim_type == claim_types::NONCE));
        let at_hash = token
            .claims
            .iter()
            .find(|c| c.claim_type == claim_types::ACCESS_TOKEN_HASH)
            .unwrap();
        assert_eq!(
            at_hash.value.as_str().unwrap(),
            crypto::oidc_token_hash("the-access-token")
        );
    }

    #[tokio::test]
    async fn test_identity_token_requires_subject() {
        let service = service(Arc::new(MockHandleStore::default()));
        let request = TokenCreationRequest::new(Client::new("app"), vec![]);
        assert!(service.create_identity_token(&request).await.is_err());
    }

    #[tokio::test]
    async fn test_access_token_shape() {
        let service = service(Arc::new(MockHandleStore::default()));
        let token = service
            .create_access_token(&creation_request())
            .await
            .unwrap();

        assert_eq!(token.token_type, TokenType::Access);
        assert_eq!(token.audience, "https://localhost:44333/resources");
        assert_eq!(token.lifetime, 3600);
        assert_eq!(token.scopes(), vec!["openid", "api1"]);
        // include_jwt_id defaults to false.
        assert!(!token.claims.iter().any(|c| c.claim_type == claim_types::JWT_ID));
    }

    #[tokio::test]
    async fn test_reference_token_is_stored_under_handle() {
        let handles = Arc::new(MockHandleStore::default());
        let service = service(handles.clone());

        let mut client = Client::new("app");
        client.access_token_type = AccessTokenType::Reference;
        let token = service
            .create_access_token(&creation_request())
            .await
            .unwrap();

        let handle = service
            .create_security_token(token.clone(), &client)
            .await
            .unwrap();
        assert_eq!(handle.len(), 43);
        assert!(!handle.contains('.'));
        assert_eq!(handles.get(&handle).await.unwrap(), Some(token));
    }

    #[tokio::test]
    async fn test_jwt_access_token_is_signed() {
        let service = service(Arc::new(MockHandleStore::default()));
        let client = Client::new("app");
        let token = service
            .create_access_token(&creation_request())
            .await
            .unwrap();
        let jwt = service.create_security_token(token, &client).await.unwrap();
        assert_eq!(jwt.split('.').count(), 3);
    }
}

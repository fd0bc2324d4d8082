//! End-to-end exercises of the token pipeline over the in-memory stores:
//! client authentication, code redemption, token issuance, refresh
//! rotation, introspection, and liveness.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use time::OffsetDateTime;

use veridian_auth::claims::DefaultClaimsProvider;
use veridian_auth::config::AuthConfig;
use veridian_auth::crypto;
use veridian_auth::events::Event;
use veridian_auth::oauth::authorize::AuthorizationCodeIssuer;
use veridian_auth::prelude::*;
use veridian_auth::validation::liveness::TokenLivenessValidator;
use veridian_store_memory::{
    InMemoryAuthorizationCodeStore, InMemoryClientStore, InMemoryRefreshTokenStore,
    InMemoryScopeStore, InMemoryTokenHandleStore, InMemoryUserService, RecordingEventSink,
    TestUser,
};

struct Pipeline {
    clients: Arc<InMemoryClientStore>,
    users: Arc<InMemoryUserService>,
    codes: Arc<InMemoryAuthorizationCodeStore>,
    refresh_store: Arc<InMemoryRefreshTokenStore>,
    events: Arc<RecordingEventSink>,
    code_issuer: AuthorizationCodeIssuer,
    client_authenticator: ClientSecretAuthenticator,
    scope_authenticator: ScopeSecretAuthenticator,
    request_validator: TokenRequestValidator,
    response_generator: TokenResponseGenerator,
    token_validator: Arc<TokenValidator>,
    introspection: IntrospectionRequestValidator,
}

fn code_client() -> Client {
    let mut client = Client::new("codeclient");
    client.client_secrets = vec![Secret::shared_hash(
        STANDARD.encode(crypto::sha256(b"secret")),
    )];
    client.grant_types = vec![GrantType::AuthorizationCode, GrantType::RefreshToken];
    client.redirect_uris = vec!["https://app.example.com/cb".to_string()];
    client.allowed_scopes = vec![
        "openid".to_string(),
        "api1".to_string(),
        "offline_access".to_string(),
    ];
    client
}

fn api_scope() -> Scope {
    let mut scope = Scope::resource("api1");
    scope.scope_secrets = vec![Secret::shared_hash(
        STANDARD.encode(crypto::sha256(b"api-secret")),
    )];
    scope
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("veridian=debug")),
        )
        .with_test_writer()
        .try_init();
}

fn pipeline() -> Pipeline {
    init_tracing();
    let config = Arc::new(AuthConfig::default());
    let events = Arc::new(RecordingEventSink::new());
    let clients = Arc::new(InMemoryClientStore::with_clients([code_client()]));
    let scopes = Arc::new(InMemoryScopeStore::with_scopes([
        Scope::open_id(),
        api_scope(),
        Scope::offline_access(),
    ]));
    let users = Arc::new(InMemoryUserService::with_users([TestUser::new(
        "alice-id", "alice", "pass",
    )
    .with_claims(vec![Claim::string("email", "alice@example.com")])]));
    let codes = Arc::new(InMemoryAuthorizationCodeStore::new());
    let refresh_store = Arc::new(InMemoryRefreshTokenStore::new());
    let handles = Arc::new(InMemoryTokenHandleStore::new());
    let keys = Arc::new(InMemorySigningKeyService::generate().unwrap());

    let token_service = Arc::new(TokenService::new(
        Arc::new(DefaultClaimsProvider::new(users.clone())),
        TokenSigningService::new(keys.clone()),
        handles.clone(),
        events.clone(),
        config.clone(),
    ));
    let refresh_service = Arc::new(RefreshTokenService::new(
        refresh_store.clone(),
        events.clone(),
    ));
    let token_validator = Arc::new(TokenValidator::new(
        keys,
        handles,
        TokenLivenessValidator::new(users.clone(), clients.clone()),
        config.clone(),
    ));

    Pipeline {
        code_issuer: AuthorizationCodeIssuer::new(codes.clone(), events.clone()),
        client_authenticator: ClientSecretAuthenticator::new(
            clients.clone(),
            SecretParserChain::default_chain(config.input_lengths.clone()),
            SecretValidatorChain::default_chain(config.clone()),
            events.clone(),
        ),
        scope_authenticator: ScopeSecretAuthenticator::new(
            scopes.clone(),
            SecretParserChain::default_chain(config.input_lengths.clone()),
            SecretValidatorChain::default_chain(config.clone()),
            events.clone(),
        ),
        request_validator: TokenRequestValidator::new(
            codes.clone(),
            refresh_store.clone(),
            scopes,
            users.clone(),
            CustomGrantRegistry::new(),
            events.clone(),
            config.clone(),
        ),
        response_generator: TokenResponseGenerator::new(token_service, refresh_service),
        introspection: IntrospectionRequestValidator::new(token_validator.clone()),
        token_validator,
        clients,
        users,
        codes,
        refresh_store,
        events,
    }
}

fn basic_auth(id: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{id}:{secret}")))
}

fn authorization_code() -> AuthorizationCode {
    AuthorizationCode {
        client_id: "codeclient".to_string(),
        subject: Subject::new("alice-id").with_auth_time(OffsetDateTime::now_utc().unix_timestamp()),
        created_at: OffsetDateTime::now_utc(),
        is_open_id: true,
        requested_scopes: vec![
            "openid".to_string(),
            "api1".to_string(),
            "offline_access".to_string(),
        ],
        granted_scopes: vec![
            "openid".to_string(),
            "api1".to_string(),
            "offline_access".to_string(),
        ],
        redirect_uri: "https://app.example.com/cb".to_string(),
        nonce: Some("n-0S6_WzA2Mj".to_string()),
        session_id: Some("sess-1".to_string()),
        code_challenge: None,
        code_challenge_method: None,
    }
}

async fn redeem(p: &Pipeline, handle: &str) -> veridian_auth::token::TokenResponse {
    let context = RequestContext::new()
        .with_header("Authorization", basic_auth("codeclient", "secret"))
        .with_body(format!(
            "grant_type=authorization_code&code={handle}&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb"
        ));
    let client = p.client_authenticator.authenticate(&context).await.unwrap();
    let validated = p.request_validator.validate(&context, &client).await.unwrap();
    p.response_generator.generate(validated).await.unwrap()
}

#[tokio::test]
async fn test_authorization_code_flow_end_to_end() {
    let p = pipeline();
    let handle = p.code_issuer.issue(authorization_code()).await.unwrap();
    assert_eq!(handle.len(), 43);

    let response = redeem(&p, &handle).await;
    assert_eq!(response.token_type, "Bearer");
    assert_eq!(response.expires_in, 3600);
    assert_eq!(response.scope.as_deref(), Some("openid api1 offline_access"));

    // The access token validates and carries the expected identity.
    let validated = p
        .token_validator
        .validate_access_token(&response.access_token)
        .await
        .unwrap();
    assert_eq!(validated.subject(), Some("alice-id"));
    assert_eq!(validated.client_id(), Some("codeclient"));
    assert!(validated.scopes().contains(&"api1"));

    // The identity token binds the access token via at_hash.
    let id_token = response.id_token.expect("openid request yields an id token");
    let validated_identity = p
        .token_validator
        .validate_identity_token(&id_token, "codeclient")
        .await
        .unwrap();
    assert_eq!(validated_identity.subject(), Some("alice-id"));
    let at_hash = validated_identity
        .claims
        .iter()
        .find(|c| c.claim_type == "at_hash")
        .expect("at_hash present");
    assert_eq!(
        at_hash.value.as_str().unwrap(),
        crypto::oidc_token_hash(&response.access_token)
    );

    // offline_access yields a refresh token.
    assert!(response.refresh_token.is_some());

    // The code was consumed.
    assert!(p.codes.get(&handle).await.unwrap().is_none());
}

#[tokio::test]
async fn test_code_reuse_fails() {
    let p = pipeline();
    let handle = p.code_issuer.issue(authorization_code()).await.unwrap();
    redeem(&p, &handle).await;

    let context = RequestContext::new()
        .with_header("Authorization", basic_auth("codeclient", "secret"))
        .with_body(format!(
            "grant_type=authorization_code&code={handle}&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb"
        ));
    let client = p.client_authenticator.authenticate(&context).await.unwrap();
    let err = p
        .request_validator
        .validate(&context, &client)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidGrant { .. }));
}

#[tokio::test]
async fn test_refresh_grant_rotates_and_invalidates_old_handle() {
    let p = pipeline();
    let handle = p.code_issuer.issue(authorization_code()).await.unwrap();
    let first = redeem(&p, &handle).await;
    let old_refresh = first.refresh_token.unwrap();

    let context = RequestContext::new()
        .with_header("Authorization", basic_auth("codeclient", "secret"))
        .with_body(format!("grant_type=refresh_token&refresh_token={old_refresh}"));
    let client = p.client_authenticator.authenticate(&context).await.unwrap();
    let validated = p.request_validator.validate(&context, &client).await.unwrap();
    let second = p.response_generator.generate(validated).await.unwrap();

    let new_refresh = second.refresh_token.unwrap();
    assert_ne!(old_refresh, new_refresh);
    assert!(p.refresh_store.get(&old_refresh).await.unwrap().is_none());
    assert!(p.refresh_store.get(&new_refresh).await.unwrap().is_some());

    // The re-issued access token still validates.
    assert!(p
        .token_validator
        .validate_access_token(&second.access_token)
        .await
        .is_ok());

    // The consumed handle cannot be replayed.
    let err = p
        .request_validator
        .validate(&context, &client)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidGrant { .. }));
}

#[tokio::test]
async fn test_introspection_respects_scope_visibility() {
    let p = pipeline();
    let handle = p.code_issuer.issue(authorization_code()).await.unwrap();
    let response = redeem(&p, &handle).await;

    // The API authenticates with its scope secret, then introspects.
    let context = RequestContext::new()
        .with_header("Authorization", basic_auth("api1", "api-secret"))
        .with_body(format!("token={}", response.access_token));
    let caller = p.scope_authenticator.authenticate(&context).await.unwrap();
    let result = p.introspection.validate(&context, &caller).await.unwrap();
    assert!(result.active);
    assert_eq!(result.claims["sub"], "alice-id");

    // A scope the token was not issued for sees it as inactive.
    let foreign = Scope::resource("api2");
    let result = p.introspection.validate(&context, &foreign).await.unwrap();
    assert!(!result.active);
}

#[tokio::test]
async fn test_deactivated_subject_fails_liveness() {
    let p = pipeline();
    let handle = p.code_issuer.issue(authorization_code()).await.unwrap();
    let response = redeem(&p, &handle).await;

    assert!(p
        .token_validator
        .validate_access_token(&response.access_token)
        .await
        .is_ok());

    p.users.deactivate("alice-id").await;
    let err = p
        .token_validator
        .validate_access_token(&response.access_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken { .. }));
}

#[tokio::test]
async fn test_disabled_client_fails_liveness() {
    let p = pipeline();
    let handle = p.code_issuer.issue(authorization_code()).await.unwrap();
    let response = redeem(&p, &handle).await;

    let mut disabled = code_client();
    disabled.enabled = false;
    p.clients.upsert(disabled).await;

    let err = p
        .token_validator
        .validate_access_token(&response.access_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken { .. }));
}

#[tokio::test]
async fn test_audit_trail_of_full_flow() {
    let p = pipeline();
    let handle = p.code_issuer.issue(authorization_code()).await.unwrap();
    redeem(&p, &handle).await;

    let events = p.events.events().await;
    let mut kinds: Vec<&'static str> = Vec::new();
    for event in &events {
        kinds.push(match event {
            Event::AuthorizationCodeIssued { .. } => "code_issued",
            Event::ClientAuthenticationSuccess { .. } => "client_auth",
            Event::AuthorizationCodeRedeemed { .. } => "code_redeemed",
            Event::RefreshTokenIssued { .. } => "refresh_issued",
            Event::TokenIssued { .. } => "token_issued",
            _ => "other",
        });
    }
    assert_eq!(
        kinds,
        vec![
            "code_issued",
            "client_auth",
            "code_redeemed",
            "refresh_issued",
            "token_issued",
            "token_issued",
        ]
    );
}

#[tokio::test]
async fn test_wrong_client_secret_is_rejected_uniformly() {
    let p = pipeline();
    let context = RequestContext::new()
        .with_header("Authorization", basic_auth("codeclient", "wrong"))
        .with_body("grant_type=authorization_code");
    let err = p.client_authenticator.authenticate(&context).await.unwrap_err();

    let context = RequestContext::new()
        .with_header("Authorization", basic_auth("ghost", "secret"))
        .with_body("grant_type=authorization_code");
    let err2 = p.client_authenticator.authenticate(&context).await.unwrap_err();

    assert_eq!(err.to_string(), err2.to_string());
}

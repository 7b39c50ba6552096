use secrecy::Secret;
use testcontainers_modules::postgres;
use testcontainers_modules::testcontainers::{ContainerAsync, runners::AsyncRunner};
use tokio::task::JoinSet;
use warden_adapters::{
    authentication::{JwtTokenConfig, JwtTokenIssuer},
    events::RecordingEventPublisher,
    password::Argon2PasswordHasher,
    persistence::PostgresCredentialStore,
};
use warden_application::{CredentialError, CredentialService, RegistrationRequest, VerificationLinks};
use warden_core::{
    CredentialStore, CredentialStoreError, Email, Password, PasswordHash, PersonName,
    PhoneNumber, RawToken, TokenIssuer, TokenIssuerError, TokenKind, User, VerificationToken,
};
use warden_service::{get_postgres_pool, run_migrations};

async fn start_store() -> (ContainerAsync<postgres::Postgres>, PostgresCredentialStore) {
    let container = postgres::Postgres::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");

    let pool = get_postgres_pool(&url, 10).await.unwrap();
    run_migrations(&pool).await.unwrap();

    (container, PostgresCredentialStore::new(pool))
}

fn user(address: &str, phone: &str) -> User {
    User::new(
        Email::try_from(Secret::from(address.to_owned())).unwrap(),
        PasswordHash::new(Secret::from("$argon2id$placeholder".to_owned())),
        PersonName::parse("Ada").unwrap(),
        PersonName::parse("Lovelace").unwrap(),
        PhoneNumber::parse(phone).unwrap(),
    )
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn unique_constraints_map_to_duplicate_errors() {
    let (_container, store) = start_store().await;
    store
        .create_user(&user("ada@example.com", "+15550000001"))
        .await
        .unwrap();

    assert_eq!(
        store
            .create_user(&user("ada@example.com", "+15550000002"))
            .await,
        Err(CredentialStoreError::DuplicateEmail)
    );
    assert_eq!(
        store
            .create_user(&user("grace@example.com", "+1 555 000 0001"))
            .await,
        Err(CredentialStoreError::DuplicatePhone)
    );
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn stored_user_reads_back_by_every_key() {
    let (_container, store) = start_store().await;
    let created = user("ada@example.com", "+15550000001");
    store.create_user(&created).await.unwrap();

    let by_email = store
        .get_user_by_email(&created.email)
        .await
        .unwrap()
        .unwrap();
    let by_phone = store
        .get_user_by_phone_hash(&created.phone_hash)
        .await
        .unwrap()
        .unwrap();
    let by_id = store.get_user_by_id(&created.id).await.unwrap().unwrap();

    assert_eq!(by_email.id, created.id);
    assert_eq!(by_phone.id, created.id);
    assert_eq!(by_id.full_name(), "Ada Lovelace");
    assert!(!by_id.email_verified);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn concurrent_password_resets_redeem_exactly_once() {
    let (_container, store) = start_store().await;
    let owner = user("ada@example.com", "+15550000001");
    store.create_user(&owner).await.unwrap();

    let token = VerificationToken::new(
        owner.id,
        TokenKind::PasswordReset,
        RawToken::generate().hash(),
    );
    store.create_verification_token(&token).await.unwrap();

    let mut attempts = JoinSet::new();
    for i in 0..8 {
        let store = store.clone();
        let token_id = token.id;
        let user_id = owner.id;
        attempts.spawn(async move {
            let hash = PasswordHash::new(Secret::from(format!("$argon2id$attempt-{i}")));
            store
                .redeem_password_reset(&token_id, &user_id, &hash)
                .await
        });
    }

    let mut redeemed = 0;
    while let Some(result) = attempts.join_next().await {
        match result.unwrap() {
            Ok(()) => redeemed += 1,
            Err(e) => assert_eq!(e, CredentialStoreError::TokenAlreadyUsed),
        }
    }
    assert_eq!(redeemed, 1);

    let stored = store
        .get_verification_token(TokenKind::PasswordReset, &token.token_hash)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.used);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn refresh_rotation_is_single_use() {
    let (_container, store) = start_store().await;
    let owner = user("ada@example.com", "+15550000001");
    store.create_user(&owner).await.unwrap();

    let issuer = JwtTokenIssuer::new(
        store.clone(),
        JwtTokenConfig::new(Secret::from("integration-secret".to_owned())),
    );
    let first = issuer
        .generate_and_store_refresh_token(&owner.id)
        .await
        .unwrap();

    let (user_id, _second) = issuer.rotate_refresh_token(&first.token).await.unwrap();
    assert_eq!(user_id, owner.id);

    let replay = issuer.rotate_refresh_token(&first.token).await;
    assert!(matches!(replay, Err(TokenIssuerError::InvalidToken)));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn registration_to_login_against_postgres() {
    let (_container, store) = start_store().await;
    let publisher = RecordingEventPublisher::new();
    let service = CredentialService::new(
        store.clone(),
        Argon2PasswordHasher::new(),
        JwtTokenIssuer::new(
            store.clone(),
            JwtTokenConfig::new(Secret::from("integration-secret".to_owned())),
        ),
        Some(publisher.clone()),
        VerificationLinks::default(),
    );

    let request = RegistrationRequest::parse(
        Secret::from("Ada@Example.com".to_owned()),
        Secret::from("analytical-engine".to_owned()),
        "Ada",
        "Lovelace",
        "+15550000001",
    )
    .unwrap();
    let email = request.email.clone();
    let password = request.password.clone();

    let token = service.register(request).await.unwrap();

    assert!(matches!(
        service.login(&email, &password).await,
        Err(CredentialError::EmailNotVerified)
    ));

    service.verify_email(&token).await.unwrap();
    assert!(matches!(
        service.verify_email(&token).await,
        Err(CredentialError::TokenAlreadyUsed)
    ));

    let tokens = service.login(&email, &password).await.unwrap();
    service.logout(&tokens.refresh_token).await.unwrap();

    let wrong = Password::try_from(Secret::from("difference-engine".to_owned())).unwrap();
    assert!(matches!(
        service.login(&email, &wrong).await,
        Err(CredentialError::InvalidCredentials)
    ));

    let actions: Vec<_> = publisher
        .audits()
        .into_iter()
        .map(|event| event.action)
        .collect();
    assert_eq!(actions, ["registration", "email_verified", "login", "logout"]);
}

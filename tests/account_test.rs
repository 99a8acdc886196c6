mod common;

use acmex_core::prelude::*;
use common::MockAcmeServer;
use std::sync::Arc;

#[tokio::test]
async fn registers_a_new_account_against_a_mock_directory() -> Result<()> {
    let mut mock_server = MockAcmeServer::new().await;
    let _m_dir = mock_server.mock_directory().await;
    let _m_nonce = mock_server.mock_new_nonce().await;
    let _m_account = mock_server.mock_new_account().await;

    let registry = Registry::default();
    let session = Arc::new(Session::new(
        &format!("{}/directory", mock_server.url()),
        &registry,
        NetworkSettings::default(),
        None,
    )?);

    let key = KeyPair::generate(KeyType::EcdsaP256)?;
    let signer = key.signer();

    let (login, account, already_existed) = Account::create(
        session,
        signer,
        NewAccountRequest::new()
            .with_contacts(vec![Contact::email("admin@example.com")])
            .agree_to_terms_of_service(),
    )
    .await?;

    assert_eq!(account.status(), AccountStatus::Valid);
    assert_eq!(account.contacts(), &["mailto:admin@example.com"]);
    assert_eq!(account.url(), login.account_url());
    assert!(!already_existed, "new-account mock returns 201, not 200");

    Ok(())
}

#[tokio::test]
async fn detects_an_already_existing_account_via_200_status() -> Result<()> {
    let mut mock_server = MockAcmeServer::new().await;
    let _m_dir = mock_server.mock_directory().await;
    let _m_nonce = mock_server.mock_new_nonce().await;
    let _m_account = mock_server.mock_existing_account().await;

    let registry = Registry::default();
    let session = Arc::new(Session::new(
        &format!("{}/directory", mock_server.url()),
        &registry,
        NetworkSettings::default(),
        None,
    )?);

    let key = KeyPair::generate(KeyType::EcdsaP256)?;
    let signer = key.signer();

    let (_login, _account, already_existed) =
        Account::create(session, signer, NewAccountRequest::new().only_return_existing()).await?;

    assert!(already_existed);

    Ok(())
}

#[tokio::test]
async fn bind_attaches_an_existing_account_url_without_a_network_call() -> Result<()> {
    let mut mock_server = MockAcmeServer::new().await;
    let _m_dir = mock_server.mock_directory().await;

    let registry = Registry::default();
    let session = Arc::new(Session::new(
        &format!("{}/directory", mock_server.url()),
        &registry,
        NetworkSettings::default(),
        None,
    )?);

    let key = KeyPair::generate(KeyType::EcdsaP256)?;
    let signer = key.signer();
    let account_url = format!("{}/account/1", mock_server.url());

    let login = Account::bind(session, signer, account_url.clone());
    assert_eq!(login.account_url(), account_url);

    Ok(())
}

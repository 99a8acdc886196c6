//! Orders a certificate for a single domain against Let's Encrypt staging
//! using the `http-01` challenge. Presenting the challenge response is the
//! caller's job — this demo just prints what to serve where, on the
//! assumption a web server is already listening on the domain.

use acmex_core::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let registry = Registry::default();
    let session = Arc::new(Session::new(
        "acme://letsencrypt.org/staging",
        &registry,
        NetworkSettings::default(),
        None,
    )?);

    let key = KeyPair::generate(KeyType::EcdsaP256)?;
    let signer = key.signer();

    println!("registering account...");
    let (_login, account, already_existed) = Account::create(
        session,
        signer,
        NewAccountRequest::new()
            .with_contacts(vec![Contact::email("admin@example.com")])
            .agree_to_terms_of_service(),
    )
    .await?;
    println!(
        "account {} ({})",
        account.url(),
        if already_existed { "existing" } else { "new" }
    );

    let identifier = Identifier::dns("example.com")?;
    let mut order = account.new_order(vec![identifier], None, None, None).await?;
    println!("order created: {}", order.url());

    for authz in order.authorizations().await? {
        let challenge = authz
            .find_challenge(ChallengeType::Http01)
            .expect("server did not offer http-01");
        let key_authorization = challenge.key_authorization().await?;
        println!(
            "serve \"{key_authorization}\" at http://{}/.well-known/acme-challenge/{}",
            authz.identifier().value,
            challenge.token()
        );
    }

    println!("press enter once the challenge responses are being served");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input).ok();

    for mut authz in order.authorizations().await? {
        if let Some(challenge) = authz.find_challenge_mut(ChallengeType::Http01) {
            challenge.trigger().await?;
            challenge.wait_for_completion(Duration::from_secs(60), None).await?;
        }
    }

    order.wait_until_ready(Duration::from_secs(120), None).await?;
    println!("order ready, finalizing (CSR generation is the caller's responsibility)");

    Ok(())
}

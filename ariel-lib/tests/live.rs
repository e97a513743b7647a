#![cfg(feature = "rustls")]

use ariel_lib::{Credentials, Error, UserType};

// Needs a real account: ARIEL_USERNAME=name.surname ARIEL_PASSWORD=... cargo test -- --ignored
#[tokio::test]
#[ignore]
async fn live_session() -> Result<(), Error> {
    let (Ok(username), Ok(password)) = (
        std::env::var("ARIEL_USERNAME"),
        std::env::var("ARIEL_PASSWORD"),
    ) else {
        println!("ARIEL_USERNAME or ARIEL_PASSWORD not set, skipping");
        return Ok(());
    };

    let mut ariel = ariel_lib::connect();
    let result = ariel
        .login(&Credentials::new(username, password, UserType::Student), None)
        .await;
    assert!(result.is_success(), "{result:?}");

    for course in ariel.courses(None).await? {
        println!("{} | {} | {}", course.name(), course.edition(), course.link());
    }
    for entry in ariel.recent_activity(None).await? {
        println!("{} | {} | {}", entry.course_name, entry.title, entry.date);
    }

    Ok(())
}

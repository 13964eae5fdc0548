//! Bearer-token tests: issue/verify round trips and the stale-credential
//! rule that forces re-login after a password rotation.

use chrono::{Duration, Utc};
use secrecy::SecretString;

use petal_api::config::JwtConfig;
use petal_api::models::AuthUser;
use petal_api::services::auth::{sign_token, verify_token};
use petal_core::{Email, Role, UserId};

fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: SecretString::from("q4$Wn8!bZ2@xK7#mP1&vT9*rC5^jF3(h".to_string()),
        expiry_hours: 72,
    }
}

fn auth_user(password_changed_at: Option<chrono::DateTime<Utc>>) -> AuthUser {
    let now = Utc::now();
    AuthUser {
        id: UserId::generate(),
        name: "Integration Tester".to_string(),
        email: Email::parse("tester@petal.shop").expect("valid email"),
        phone_number: "01012345678".to_string(),
        role: Role::Customer,
        photo: "default.jpg".to_string(),
        active: true,
        password_hash: "$argon2id$...".to_string(),
        password_changed_at,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_token_round_trip_carries_subject() {
    let config = jwt_config();
    let user_id = UserId::generate();

    let token = sign_token(user_id, &config).expect("token signs");
    let claims = verify_token(&token, &config).expect("token verifies");

    assert_eq!(claims.sub, user_id.to_string());
    let parsed: UserId = claims.sub.parse().expect("subject is a user id");
    assert_eq!(parsed, user_id);
}

#[test]
fn test_token_lifetime_matches_config() {
    let config = jwt_config();
    let token = sign_token(UserId::generate(), &config).expect("token signs");
    let claims = verify_token(&token, &config).expect("token verifies");

    let lifetime = claims.exp - claims.iat;
    assert_eq!(lifetime, 72 * 3600);
}

#[test]
fn test_foreign_secret_is_rejected() {
    let token = sign_token(UserId::generate(), &jwt_config()).expect("token signs");

    let other = JwtConfig {
        secret: SecretString::from("z8@Lm3#qY6!wX1$nK9&dR4*vB7^gT2(c".to_string()),
        expiry_hours: 72,
    };
    assert!(verify_token(&token, &other).is_err());
}

#[test]
fn test_token_issued_before_password_change_is_stale() {
    let config = jwt_config();
    let token = sign_token(UserId::generate(), &config).expect("token signs");
    let claims = verify_token(&token, &config).expect("token verifies");

    // Password rotated well after this token was issued.
    let user = auth_user(Some(Utc::now() + Duration::hours(1)));
    assert!(user.changed_password_after(claims.iat));

    // Rotation stamped before issuance leaves the token fresh.
    let user = auth_user(Some(Utc::now() - Duration::hours(1)));
    assert!(!user.changed_password_after(claims.iat));

    // No rotation recorded: nothing can be stale.
    let user = auth_user(None);
    assert!(!user.changed_password_after(claims.iat));
}

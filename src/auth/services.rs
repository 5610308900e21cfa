use rand::Rng;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use super::{
    dto::{SignInRequest, SignUpRequest, VerifyCodeRequest},
    password,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::{NewUser, User},
};

/// Six random digits, never starting with zero.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

#[derive(Debug, PartialEq, Eq)]
pub enum CodeCheck {
    Valid,
    Expired,
    Incorrect,
}

/// Compares a submitted code with the one stored on the user.
pub fn check_code(user: &User, submitted: &str, now: OffsetDateTime) -> CodeCheck {
    let Some(stored) = user.verify_code.as_deref() else {
        return CodeCheck::Incorrect;
    };
    if stored != submitted {
        return CodeCheck::Incorrect;
    }
    match user.verify_code_expiry {
        Some(expiry) if expiry > now => CodeCheck::Valid,
        _ => CodeCheck::Expired,
    }
}

/// Creates an unverified user, or refreshes an unverified registration made
/// with the same email, then mails the verification code.
pub async fn sign_up(st: &AppState, req: SignUpRequest) -> AppResult<User> {
    if let Some(holder) = st.store.find_by_username(&req.username).await? {
        if holder.is_verified || holder.email != req.email {
            warn!(username = %req.username, "username already taken");
            return Err(AppError::conflict("Username is already taken"));
        }
    }

    let by_email = st.store.find_by_email(&req.email).await?;
    if by_email.as_ref().is_some_and(|u| u.is_verified) {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::conflict("User already exists with this email"));
    }

    let code = generate_code();
    let new = NewUser {
        username: req.username,
        email: req.email,
        password_hash: password::hash(&req.password)?,
        verify_code: code.clone(),
        verify_code_expiry: OffsetDateTime::now_utc()
            + Duration::minutes(st.config.verify_code_ttl_minutes),
    };

    let user = match by_email {
        Some(pending) => {
            info!(user_id = %pending.id, "refreshing unverified registration");
            st.store.refresh_registration(pending.id, new).await?
        }
        None => st.store.create(new).await?,
    };

    st.mailer
        .send_verification(&user.email, &user.username, &code)
        .await
        .map_err(AppError::Mail)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Whether `username` is free to register.
pub async fn username_available(st: &AppState, username: &str) -> AppResult<bool> {
    Ok(st.store.find_by_username(username).await?.is_none())
}

#[derive(Debug, PartialEq, Eq)]
pub enum Verified {
    Now,
    Already,
}

pub async fn verify_code(st: &AppState, req: &VerifyCodeRequest) -> AppResult<Verified> {
    let username = req.username.trim();
    let user = st
        .store
        .find_by_username(username)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if user.is_verified {
        return Ok(Verified::Already);
    }

    match check_code(&user, req.code.trim(), OffsetDateTime::now_utc()) {
        CodeCheck::Valid => {
            if !st.store.mark_verified(user.id).await? {
                return Err(AppError::not_found("User not found"));
            }
            info!(user_id = %user.id, "account verified");
            Ok(Verified::Now)
        }
        CodeCheck::Expired => {
            warn!(user_id = %user.id, "verification code expired");
            Err(AppError::bad_request(
                "Verification code has expired. Please sign up again to get a new code.",
            ))
        }
        CodeCheck::Incorrect => {
            warn!(user_id = %user.id, "incorrect verification code");
            Err(AppError::bad_request("Incorrect verification code"))
        }
    }
}

/// Checks credentials. Unverified accounts are refused even with the right password.
pub async fn sign_in(st: &AppState, req: &SignInRequest) -> AppResult<User> {
    let identifier = req.identifier.trim();
    let Some(user) = st.store.find_by_identifier(identifier).await? else {
        password::burn_verify(&req.password);
        warn!(%identifier, "sign-in unknown identifier");
        return Err(AppError::unauthorized("Invalid credentials"));
    };

    if !password::verify(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "sign-in invalid password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    if !user.is_verified {
        warn!(user_id = %user.id, "sign-in before verification");
        return Err(AppError::forbidden(
            "Please verify your account before logging in",
        ));
    }

    info!(user_id = %user.id, "user signed in");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn pending_user(code: &str, expiry: OffsetDateTime) -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: String::new(),
            verify_code: Some(code.into()),
            verify_code_expiry: Some(expiry),
            is_verified: false,
            is_accepting_messages: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..200 {
            let c = generate_code();
            assert_eq!(c.len(), 6);
            assert!(c.chars().all(|ch| ch.is_ascii_digit()));
            assert_ne!(c.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn only_exact_unexpired_code_is_valid() {
        let now = OffsetDateTime::now_utc();
        let user = pending_user("123456", now + Duration::minutes(10));
        assert_eq!(check_code(&user, "123456", now), CodeCheck::Valid);
        assert_eq!(check_code(&user, "123457", now), CodeCheck::Incorrect);
        assert_eq!(check_code(&user, "12345", now), CodeCheck::Incorrect);
        assert_eq!(check_code(&user, "", now), CodeCheck::Incorrect);
    }

    #[test]
    fn matching_code_past_expiry_is_expired() {
        let now = OffsetDateTime::now_utc();
        let user = pending_user("123456", now - Duration::seconds(1));
        assert_eq!(check_code(&user, "123456", now), CodeCheck::Expired);
        assert_eq!(check_code(&user, "654321", now), CodeCheck::Incorrect);
    }

    #[test]
    fn cleared_code_never_matches() {
        let now = OffsetDateTime::now_utc();
        let mut user = pending_user("123456", now + Duration::minutes(10));
        user.verify_code = None;
        assert_eq!(check_code(&user, "123456", now), CodeCheck::Incorrect);
    }
}

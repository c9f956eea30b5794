use validator::Validate;

use crate::entities::token::{AuthResponse, Claims};
use crate::entities::user::{normalize_email, LoginUser, NewUser, NewUserResponse};
use crate::errors::{AppError, AuthError};
use crate::interfaces::repositories::user::UserRepository;
use crate::auth::password::{hash_password, verify_password};
use crate::repositories::token::TokenServiceRepository;

pub struct AuthHandler<R, T>
where
    R: UserRepository,
    T: TokenServiceRepository,
{
    pub user_repo: R,
    pub token_service: T,
}

impl<R, T> AuthHandler<R, T>
where
    R: UserRepository,
    T: TokenServiceRepository,
{
    pub fn new(user_repo: R, token_service: T) -> Self {
        AuthHandler {
            user_repo,
            token_service
        }
    }

    /// Registers a new user after validation and password hashing
    pub async fn register(&self, request: NewUser) -> Result<NewUserResponse, AppError> {
        let request = request.normalized();
        request.validate()?;

        let hashed_password = hash_password(&request.password)?;
        let user_insert = request.prepare_for_insert(hashed_password);

        let id = self.user_repo.create_user(&user_insert).await?;
        tracing::info!(user_id = %id, "User registered");

        Ok(NewUserResponse {
            id,
            message: "User registered successfully".to_string(),
        })
    }

    /// Logs in a user by checking credentials and issuing a token
    pub async fn login(&self, request: LoginUser) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let user = self.user_repo.get_user_by_email(&normalize_email(&request.email))
            .await
            .map_err(|e| {
                tracing::error!("User lookup failed during login: {}", e);
                AuthError::WrongCredentials
            })?
            .ok_or(AuthError::WrongCredentials)?;

        let is_password_valid = verify_password(&request.password, &user.password_hash)
            .map_err(|e| {
                tracing::warn!("Stored password hash unusable for {}: {}", user.id, e);
                AuthError::WrongCredentials
            })?;
        if !is_password_valid {
            return Err(AuthError::WrongCredentials);
        }

        let token = self.token_service.create_jwt(&user)?;

        tracing::info!(user_id = %user.id, "User logged in successfully");
        Ok(AuthResponse::new(token, self.token_service.expires_in_seconds()))
    }

    /// Verifies a raw `Authorization` header value and returns its claims.
    pub fn authenticate(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        let token = extract_bearer(header)?;
        let claims = self.token_service.decode_jwt(token)?.claims;

        if uuid::Uuid::parse_str(&claims.sub).is_err() {
            return Err(AuthError::InvalidUserId);
        }
        Ok(claims)
    }
}

/// Splits `Bearer <token>`; the scheme is matched case-insensitively.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;

    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::MalformedToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::jwt::JwtService,
        entities::user::User,
        repositories::user::MockUserRepository,
        settings::tests::test_config,
    };
    use chrono::Utc;
    use mockall::predicate::*;
    use uuid::Uuid;

    fn stored_user(password: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "a@x.com".into(),
            password_hash: hash_password(password).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    fn handler(repo: MockUserRepository) -> AuthHandler<MockUserRepository, JwtService> {
        AuthHandler::new(repo, JwtService::new(&test_config()))
    }

    #[test]
    fn bearer_header_shapes() {
        assert!(matches!(extract_bearer(None), Err(AuthError::MissingToken)));
        assert!(matches!(extract_bearer(Some("abc.def.ghi")), Err(AuthError::MalformedToken)));
        assert!(matches!(extract_bearer(Some("Bearer")), Err(AuthError::MalformedToken)));
        assert!(matches!(extract_bearer(Some("Basic abc")), Err(AuthError::MalformedToken)));
        assert!(matches!(extract_bearer(Some("Bearer a b")), Err(AuthError::MalformedToken)));
        assert_eq!(extract_bearer(Some("bearer abc")).unwrap(), "abc");
        assert_eq!(extract_bearer(Some("Bearer   abc ")).unwrap(), "abc");
    }

    #[tokio::test]
    async fn register_hashes_password_and_normalizes_email() {
        let mut repo = MockUserRepository::new();
        let id = Uuid::new_v4();
        repo.expect_create_user()
            .withf(|insert| {
                insert.email == "a@x.com"
                    && insert.password_hash.starts_with("$argon2id$")
                    && insert.password_hash != "pw123"
            })
            .times(1)
            .returning(move |_| Ok(id));

        let response = handler(repo)
            .register(NewUser {
                username: "alice".into(),
                email: "A@x.com".into(),
                password: "pw123".into(),
            })
            .await
            .unwrap();

        assert_eq!(response.id, id);
    }

    #[tokio::test]
    async fn register_with_missing_fields_never_touches_the_store() {
        let mut repo = MockUserRepository::new();
        repo.expect_create_user().times(0);

        let result = handler(repo)
            .register(NewUser {
                username: String::new(),
                email: "a@x.com".into(),
                password: String::new(),
            })
            .await;

        match result {
            Err(AppError::ValidationError(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["password", "username"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_issues_token_that_authenticates() {
        let user = stored_user("pw123");
        let user_id = user.id;
        let mut repo = MockUserRepository::new();
        repo.expect_get_user_by_email()
            .with(eq("a@x.com"))
            .returning(move |_| Ok(Some(user.clone())));

        let handler = handler(repo);
        let response = handler
            .login(LoginUser { email: "a@x.com".into(), password: "pw123".into() })
            .await
            .unwrap();

        assert_eq!(response.token_type, "Bearer");
        let header = format!("Bearer {}", response.token);
        let claims = handler.authenticate(Some(&header)).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let user = stored_user("pw123");
        let mut repo = MockUserRepository::new();
        repo.expect_get_user_by_email()
            .with(eq("a@x.com"))
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_get_user_by_email()
            .with(eq("nobody@x.com"))
            .returning(|_| Ok(None));

        let handler = handler(repo);
        let wrong = handler
            .login(LoginUser { email: "a@x.com".into(), password: "nope".into() })
            .await;
        let unknown = handler
            .login(LoginUser { email: "nobody@x.com".into(), password: "pw123".into() })
            .await;

        assert!(matches!(wrong, Err(AuthError::WrongCredentials)));
        assert!(matches!(unknown, Err(AuthError::WrongCredentials)));
    }

    #[tokio::test]
    async fn login_without_password_is_missing_credentials() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_user_by_email().times(0);

        let result = handler(repo)
            .login(LoginUser { email: "a@x.com".into(), password: String::new() })
            .await;

        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn authenticate_rejects_tampered_tokens() {
        let handler = handler(MockUserRepository::new());
        let user = stored_user("pw123");
        let token = handler.token_service.create_jwt(&user).unwrap();
        let tampered = format!("Bearer {}x", token);

        assert!(matches!(handler.authenticate(Some(&tampered)), Err(AuthError::InvalidSignature)));
    }
}

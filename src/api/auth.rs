use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::value_objects::BorrowerId;

use super::{error::ApiError, handlers::AppState};

/// 利用者の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// JWTのクレーム
///
/// トークンの発行は認証サービスの責務。ここでは検証のみ行う。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
}

impl Claims {
    /// HS256で署名する
    pub fn sign(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// 署名と有効期限を検証する
    pub fn verify(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

/// 認証済みの利用者（リクエストごとの識別コンテキスト）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub borrower_id: BorrowerId,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin role required".to_string()))
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("Missing authorization header".to_string()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthenticated("Invalid authorization header format".to_string())
        })?;

        let claims = Claims::verify(token, &state.jwt_secret).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            ApiError::Unauthenticated("Bad credentials".to_string())
        })?;

        Ok(Identity {
            borrower_id: BorrowerId::from_uuid(claims.sub),
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn claims(role: Role) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            role,
            exp: (chrono::Utc::now() + chrono::Duration::minutes(15)).timestamp(),
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let issued = claims(Role::Admin);
        let token = issued.sign(SECRET).unwrap();

        let verified = Claims::verify(&token, SECRET).unwrap();

        assert_eq!(verified.sub, issued.sub);
        assert_eq!(verified.role, Role::Admin);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = claims(Role::User).sign(SECRET).unwrap();
        assert!(Claims::verify(&token, "other-secret").is_err());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let mut expired = claims(Role::User);
        expired.exp = (chrono::Utc::now() - chrono::Duration::hours(1)).timestamp();
        let token = expired.sign(SECRET).unwrap();

        assert!(Claims::verify(&token, SECRET).is_err());
    }

    #[test]
    fn test_require_admin() {
        let user = Identity {
            borrower_id: BorrowerId::new(),
            role: Role::User,
        };
        let admin = Identity {
            borrower_id: BorrowerId::new(),
            role: Role::Admin,
        };
        assert!(user.require_admin().is_err());
        assert!(admin.require_admin().is_ok());
    }
}

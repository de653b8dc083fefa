pub mod mock_flows;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::auth::AuthUser;
use crate::config::{
    AuthConfig, Config, CorsConfig, CreditsConfig, DatabaseConfig, GeneratorConfig,
    LoggingConfig, MidtransConfig, ServerConfig,
};

pub fn test_config() -> Config {
    Config {
        server: ServerConfig { host: "127.0.0.1".to_string(), port: 8080 },
        auth: AuthConfig {
            issuer: "https://securetoken.google.com/test-project".to_string(),
            audience: "test-project".to_string(),
        },
        database: DatabaseConfig { url: ":memory:".to_string() },
        generator: GeneratorConfig {
            base_url: "http://localhost:3400".to_string(),
            timeout_secs: 5,
        },
        midtrans: MidtransConfig {
            server_key: "SB-Mid-server-test".to_string(),
            snap_base_url: "http://localhost:9000".to_string(),
            api_base_url: "http://localhost:9001".to_string(),
        },
        credits: CreditsConfig { initial_grant: 10, generation_cost: 2 },
        logging: LoggingConfig { level: "debug".to_string() },
        cors: CorsConfig { origins: "*".to_string() },
    }
}

#[derive(serde::Serialize)]
struct TestClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    aud: String,
    iss: String,
    exp: u64,
    iat: u64,
}

pub fn generate_test_jwt(
    user_id: &str,
    email: Option<&str>,
    name: Option<&str>,
    kid: &str,
    signing_key: &EncodingKey,
) -> String {
    let now = Utc::now();
    let claims = TestClaims {
        sub: user_id.to_string(),
        email: email.map(String::from),
        name: name.map(String::from),
        aud: "test-project".to_string(),
        iss: "https://securetoken.google.com/test-project".to_string(),
        exp: (now + Duration::hours(1)).timestamp() as u64,
        iat: now.timestamp() as u64,
    };

    let header = Header {
        alg: Algorithm::RS256,
        kid: Some(kid.to_string()),
        ..Default::default()
    };

    encode(&header, &claims, signing_key).expect("Failed to encode JWT")
}

pub fn test_auth_user(sub: &str, email: Option<&str>, name: Option<&str>) -> AuthUser {
    AuthUser {
        sub: sub.to_string(),
        email: email.map(String::from),
        name: name.map(String::from),
    }
}

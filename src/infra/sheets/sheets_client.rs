// =============================================================================
// GOOGLE SHEETS CLIENT WITH SERVICE ACCOUNT AUTHENTICATION
// =============================================================================
//
// Both sides of the bot live in one spreadsheet: the form responses sheet the
// summary commands read, and the announcement log sheet the webhook writes.
// The spreadsheet must be shared with the service account email.
//
// **Environment Variables:**
// - `GOOGLE_SERVICE_ACCOUNT_KEY` - Path to service account JSON file
// - `GOOGLE_SERVICE_ACCOUNT_JSON` - Service account JSON content (alternative)

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Sheets auth error: {0}")]
    Auth(String),
    #[error("Sheets HTTP error: {0}")]
    Http(String),
    #[error("Sheets API error ({status}): {body}")]
    Api { status: u16, body: String },
}

// =============================================================================
// SERVICE ACCOUNT AUTHENTICATION
// =============================================================================

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    /// The service account email (used as issuer in JWT).
    client_email: String,

    /// The private key in PEM format.
    private_key: String,

    /// The token URI (where to exchange JWT for an access token).
    token_uri: String,
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Cached access token with expiration.
struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

/// Authenticator that handles OAuth2 with service account credentials.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    client: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl ServiceAccountAuth {
    /// Creates a new authenticator from a JSON key file path.
    pub async fn from_file(path: &str) -> Result<Self, SheetsError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SheetsError::Auth(format!("failed to read {}: {}", path, e)))?;
        Self::from_json(&content)
    }

    /// Creates a new authenticator from JSON content.
    pub fn from_json(json: &str) -> Result<Self, SheetsError> {
        let credentials: ServiceAccountCredentials =
            serde_json::from_str(json).map_err(|e| SheetsError::Auth(e.to_string()))?;
        Ok(Self {
            credentials,
            client: Client::new(),
            cached_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Creates from environment variables.
    pub async fn from_env() -> Result<Self, SheetsError> {
        if let Ok(path) = std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY") {
            return Self::from_file(&path).await;
        }

        if let Ok(json) = std::env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
            return Self::from_json(&json);
        }

        Err(SheetsError::Auth(
            "Neither GOOGLE_SERVICE_ACCOUNT_KEY nor GOOGLE_SERVICE_ACCOUNT_JSON is set".to_string(),
        ))
    }

    /// Gets a valid access token, refreshing if necessary.
    pub async fn get_access_token(&self) -> Result<String, SheetsError> {
        // Check if we have a valid cached token
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > SystemTime::now() + Duration::from_secs(60) {
                    return Ok(token.token.clone());
                }
            }
        }

        // Need to refresh the token
        let new_token = self.fetch_new_token().await?;

        // Cache it
        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(CachedToken {
                token: new_token.clone(),
                expires_at: SystemTime::now() + Duration::from_secs(55 * 60),
            });
        }

        Ok(new_token)
    }

    /// Fetches a new access token from Google.
    async fn fetch_new_token(&self) -> Result<String, SheetsError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| SheetsError::Auth(e.to_string()))?
            .as_secs();

        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: "https://www.googleapis.com/auth/spreadsheets".to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| SheetsError::Auth(e.to_string()))?;
        let jwt = encode(&header, &claims, &key).map_err(|e| SheetsError::Auth(e.to_string()))?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .map_err(|e| SheetsError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| SheetsError::Http(e.to_string()))?;
            return Err(SheetsError::Api { status, body });
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| SheetsError::Http(e.to_string()))?;
        Ok(token_response.access_token)
    }
}

// =============================================================================
// SHEETS API RESPONSE STRUCTURES
// =============================================================================

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

// =============================================================================
// SHEETS CLIENT
// =============================================================================

/// Minimal Sheets REST client. It deliberately exposes only the two calls the
/// infra adapters need: read a range, append a row.
pub struct SheetsClient {
    client: Client,
    auth: ServiceAccountAuth,
    base_url: String,
}

impl SheetsClient {
    pub fn new(auth: ServiceAccountAuth) -> Self {
        Self {
            client: Client::new(),
            auth,
            base_url: "https://sheets.googleapis.com".to_string(),
        }
    }

    /// Reads all cell values in the A1-notation range, e.g. `Sheet1!A2:E`.
    /// Rows come back as strings in the sheet's display format.
    pub async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let token = self.auth.get_access_token().await?;
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url, spreadsheet_id, range
        );

        tracing::debug!(range, "Reading sheet values");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SheetsError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| SheetsError::Http(e.to_string()))?;
            return Err(SheetsError::Api { status, body });
        }

        let value_range: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetsError::Http(e.to_string()))?;
        Ok(value_range.values)
    }

    /// Appends one row after the last row of the table in `range`.
    pub async fn append_row(
        &self,
        spreadsheet_id: &str,
        range: &str,
        row: &[String],
    ) -> Result<(), SheetsError> {
        let token = self.auth.get_access_token().await?;
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}:append",
            self.base_url, spreadsheet_id, range
        );

        tracing::debug!(range, "Appending sheet row");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&serde_json::json!({ "values": [row] }))
            .send()
            .await
            .map_err(|e| SheetsError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| SheetsError::Http(e.to_string()))?;
            return Err(SheetsError::Api { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_range_defaults_to_empty_on_missing_values() {
        // An empty sheet range omits the `values` key entirely.
        let parsed: ValueRange = serde_json::from_str(r#"{"range":"Sheet1!A2:E"}"#).unwrap();
        assert!(parsed.values.is_empty());
    }

    #[test]
    fn value_range_parses_rows_of_strings() {
        let parsed: ValueRange =
            serde_json::from_str(r#"{"values":[["5/1/2025 10:30:00","Chess"],["x"]]}"#).unwrap();
        assert_eq!(parsed.values.len(), 2);
        assert_eq!(parsed.values[0][1], "Chess");
    }
}

use crate::error::PixometerError;
use crate::models::{AccessTokenResponse, ApiList, Meter, Reading};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://pixometer.io/api/v1";

const ACCESS_TOKEN_PATH: &str = "/access-token/";
const METERS_PATH: &str = "/meters/";
const READINGS_PATH: &str = "/readings/";

/// Thin client for the Pixometer REST API.
pub struct PixometerAPI {
    endpoint_url: String,
    client: reqwest::Client,
}

impl PixometerAPI {
    pub fn new(endpoint_url: &str) -> Result<Self, PixometerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            endpoint_url: endpoint_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub async fn request_access_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccessTokenResponse, PixometerError> {
        let request = self
            .client
            .post(format!("{}{}", self.endpoint_url, ACCESS_TOKEN_PATH))
            .form(&[("username", username), ("password", password)]);
        send_json(request, ACCESS_TOKEN_PATH).await
    }

    pub async fn list_meters(&self, authorization: &str) -> Result<ApiList<Meter>, PixometerError> {
        let request = self
            .client
            .get(format!("{}{}", self.endpoint_url, METERS_PATH))
            .header(AUTHORIZATION, authorization);
        send_json(request, METERS_PATH).await
    }

    pub async fn list_readings(
        &self,
        authorization: &str,
        page_size: u32,
    ) -> Result<ApiList<Reading>, PixometerError> {
        let request = self
            .client
            .get(format!("{}{}", self.endpoint_url, READINGS_PATH))
            .header(AUTHORIZATION, authorization)
            .query(&[("page_size", page_size)]);
        send_json(request, READINGS_PATH).await
    }
}

async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    endpoint: &'static str,
) -> Result<T, PixometerError> {
    let body = request.send().await?.error_for_status()?.bytes().await?;
    if body.is_empty() {
        return Err(PixometerError::EmptyBody { endpoint });
    }
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod test_pixometer_api {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_request_access_token() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/access-token/")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("username".into(), "jane@example.com".into()),
                Matcher::UrlEncoded("password".into(), "hunter2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"
                {
                    "access_token": "abc123",
                    "expires_in": 3600,
                    "token_type": "Bearer",
                    "user_id": 17
                }
            "#,
            )
            .create_async()
            .await;

        let api = PixometerAPI::new(&server.url()).unwrap();
        let token = api
            .request_access_token("jane@example.com", "hunter2")
            .await
            .unwrap();

        assert_eq!(token.access_token, "abc123");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.user_id, "17");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_readings_sends_auth_and_page_size() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/readings/")
            .match_header("Authorization", "Bearer abc123")
            .match_query(Matcher::UrlEncoded("page_size".into(), "10".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"
                {
                    "count": 1,
                    "results": [
                        {
                            "resource_id": 1,
                            "reading_date": "2020-01-01T00:00:00Z",
                            "value": "42",
                            "meter": "https://pixometer.io/api/v1/meters/1/"
                        }
                    ]
                }
            "#,
            )
            .create_async()
            .await;

        let api = PixometerAPI::new(&format!("{}/", server.url())).unwrap();
        let readings = api.list_readings("Bearer abc123", 10).await.unwrap();

        assert_eq!(readings.count, 1);
        assert_eq!(readings.results[0].value, "42");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/meters/")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let api = PixometerAPI::new(&server.url()).unwrap();
        let result = api.list_meters("Bearer abc123").await;

        assert!(matches!(
            result,
            Err(PixometerError::EmptyBody { endpoint: "/meters/" })
        ));
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/meters/")
            .with_status(401)
            .with_body(r#"{"detail": "Invalid token."}"#)
            .create_async()
            .await;

        let api = PixometerAPI::new(&server.url()).unwrap();
        let result = api.list_meters("Bearer expired").await;

        assert!(matches!(result, Err(PixometerError::Http(_))));
    }
}

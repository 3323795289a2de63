//! Client to access the track platform's REST API.

use super::schema::*;
use crate::config::ApiConfig;
use anyhow::bail;
use log::{debug, error};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Diagnostic prefix attached to every failure logged at the client boundary.
const ERROR_LOG_PREFIX: &str = "API request error";

/// Characters to percent-encode in a query parameter value.
///
/// This matches JavaScript's `encodeURIComponent`, which the platform's web
/// frontend uses: everything but alphanumerics and `- _ . ! ~ * ' ( )` is
/// escaped, so a space becomes `%20` rather than `+`.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Client to connect to the track platform's REST API.
///
/// Each instance carries its own configuration (base URL, timeout, default
/// headers), fixed at construction. Every method performs one live request:
/// there is no caching, no retry and no deduplication, and the client keeps
/// no state across calls beyond the underlying connection pool.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a new client for the API endpoint described by the given
    /// configuration.
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Gets the list of track summaries (`GET /tracks`).
    ///
    /// The listed tracks may come without inlined points; use
    /// [`get_track_points`](Self::get_track_points) to load them.
    pub async fn get_track_list(&self) -> anyhow::Result<ApiResponse<Vec<TrackData>>> {
        debug!("Query track list");
        self.get("tracks").await
    }

    /// Gets the points of the given track, in chronological order
    /// (`GET /tracks/{id}/points`).
    pub async fn get_track_points(
        &self,
        track_id: &str,
    ) -> anyhow::Result<ApiResponse<Vec<TrackPoint>>> {
        debug!("Query points of track {track_id}");
        self.get(&format!("tracks/{track_id}/points")).await
    }

    /// Gets every track with its full data (`GET /tracks/all`).
    pub async fn get_all_tracks(&self) -> anyhow::Result<ApiResponse<Vec<TrackData>>> {
        debug!("Query all tracks");
        self.get("tracks/all").await
    }

    /// Uploads a track data file (`POST /tracks/upload`).
    ///
    /// The file is sent as a multipart form under the field name `file`. The
    /// server replies with the identifier of the new track, or a null payload
    /// with the outcome described in the envelope's `message`.
    pub async fn upload_track_data(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> anyhow::Result<ApiResponse<Option<String>>> {
        debug!("Upload track data from {file_name} ({} bytes)", bytes.len());
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_owned());
        let form = multipart::Form::new().part("file", part);

        let result = async {
            let response = self
                .client
                .post(format!("{}/tracks/upload", self.base_url))
                .multipart(form)
                .send()
                .await?;
            let response = ApiClient::check_response_status(response).await?;
            Ok(response.json().await?)
        }
        .await;
        self.log_failure(result)
    }

    /// Searches users matching the given free-text query
    /// (`GET /users/search?q={query}`).
    pub async fn search_users(&self, query: &str) -> anyhow::Result<ApiResponse<Vec<User>>> {
        debug!("Search users matching {query:?}");
        let encoded = utf8_percent_encode(query, QUERY_ENCODE_SET);
        self.get(&format!("users/search?q={encoded}")).await
    }

    /// Gets the given user's record (`GET /users/{id}`).
    pub async fn get_user_info(&self, user_id: &str) -> anyhow::Result<ApiResponse<User>> {
        debug!("Query user {user_id}");
        self.get(&format!("users/{user_id}")).await
    }

    /// Gets the given user's tracks (`GET /users/{id}/tracks`).
    pub async fn get_user_tracks(
        &self,
        user_id: &str,
    ) -> anyhow::Result<ApiResponse<Vec<TrackData>>> {
        debug!("Query tracks of user {user_id}");
        self.get(&format!("users/{user_id}/tracks")).await
    }

    /// Gets the list of campuses (`GET /campuses`).
    pub async fn get_campus_list(&self) -> anyhow::Result<ApiResponse<Vec<Campus>>> {
        debug!("Query campus list");
        self.get("campuses").await
    }

    /// Gets the given campus's record (`GET /campuses/{id}`).
    pub async fn get_campus_info(&self, campus_id: &str) -> anyhow::Result<ApiResponse<Campus>> {
        debug!("Query campus {campus_id}");
        self.get(&format!("campuses/{campus_id}")).await
    }

    /// Checks that the backend is up (`GET /tracks/health`).
    pub async fn health(&self) -> anyhow::Result<ApiResponse<Option<String>>> {
        debug!("Query backend health");
        self.get("tracks/health").await
    }

    /// Sends a GET request for the given path relative to the base URL, and
    /// deserializes the response envelope.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<ApiResponse<T>> {
        let result = async {
            let response = self
                .client
                .get(format!("{}/{}", self.base_url, path))
                .send()
                .await?;
            let response = ApiClient::check_response_status(response).await?;
            Ok(response.json().await?)
        }
        .await;
        self.log_failure(result)
    }

    /// Logs a failed result once with a fixed diagnostic prefix, then passes
    /// it through unchanged. Callers receive the error verbatim and decide
    /// how to surface it.
    fn log_failure<T>(&self, result: anyhow::Result<T>) -> anyhow::Result<T> {
        if let Err(e) = &result {
            error!("{ERROR_LOG_PREFIX}: {e:#}");
        }
        result
    }

    /// Checks that a response carries a successful status code, returning an
    /// error with the body's diagnostics otherwise.
    async fn check_response_status(response: Response) -> anyhow::Result<Response> {
        let status_code = response.status();
        if !status_code.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Server replied with status code {status_code}: {body}");
        }
        Ok(response)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig::new(server.uri())).unwrap()
    }

    /// Logger capturing error records for inspection by tests.
    struct CaptureLogger {
        records: Mutex<Vec<String>>,
    }

    impl log::Log for CaptureLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            self.records.lock().unwrap().push(record.args().to_string());
        }

        fn flush(&self) {}
    }

    static CAPTURE: CaptureLogger = CaptureLogger {
        records: Mutex::new(Vec::new()),
    };

    /// Routes log records to [`CAPTURE`]. Only the first call actually
    /// installs the logger; the process-wide logger can be set once.
    fn install_capture() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Error);
    }

    /// Matches a request whose raw (still percent-encoded) query string
    /// equals the expected one.
    struct RawQuery(&'static str);

    impl Match for RawQuery {
        fn matches(&self, request: &Request) -> bool {
            request.url.query() == Some(self.0)
        }
    }

    /// Matches a multipart request containing a part named `file` with the
    /// expected bytes.
    struct MultipartFile(Vec<u8>);

    impl Match for MultipartFile {
        fn matches(&self, request: &Request) -> bool {
            let is_multipart = request
                .headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.starts_with("multipart/form-data"));
            is_multipart
                && contains_subslice(&request.body, b"name=\"file\"")
                && contains_subslice(&request.body, &self.0)
        }
    }

    fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[tokio::test]
    async fn get_track_list_returns_envelope_unmodified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "message": "ok",
                "data": [{
                    "id": "t1",
                    "name": "Run",
                    "accountId": "u1",
                    "points": [],
                    "startTime": "2024-01-01T00:00:00Z",
                    "endTime": "2024-01-01T01:00:00Z",
                    "totalPoints": 0
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let envelope = client.get_track_list().await.unwrap();

        assert_eq!(
            envelope,
            ApiResponse {
                code: 0,
                message: Some("ok".to_owned()),
                data: vec![TrackData {
                    id: "t1".to_owned(),
                    name: "Run".to_owned(),
                    account_id: "u1".to_owned(),
                    points: vec![],
                    start_time: "2024-01-01T00:00:00Z".to_owned(),
                    end_time: "2024-01-01T01:00:00Z".to_owned(),
                    total_points: 0,
                }],
            }
        );
    }

    #[tokio::test]
    async fn get_track_points_queries_the_track_path_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tracks/t1/points"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "message": "ok",
                "data": [{
                    "accountId": "u1",
                    "latitude": 31.2,
                    "longitude": 121.5,
                    "timestamp": "2024-01-01T00:00:00Z"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let envelope = client.get_track_points("t1").await.unwrap();

        assert_eq!(envelope.code, 0);
        assert_eq!(
            envelope.data,
            vec![TrackPoint {
                id: None,
                account_id: "u1".to_owned(),
                latitude: 31.2,
                longitude: 121.5,
                timestamp: "2024-01-01T00:00:00Z".to_owned(),
                accuracy: None,
                speed: None,
            }]
        );
    }

    #[tokio::test]
    async fn search_users_percent_encodes_the_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/search"))
            .and(RawQuery("q=a%20b%26c"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "message": "ok",
                "data": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let envelope = client.search_users("a b&c").await.unwrap();
        assert!(envelope.data.is_empty());
    }

    #[tokio::test]
    async fn upload_sends_multipart_file_field() {
        let file_bytes = b"lat,lon\n31.2,121.5\n".to_vec();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tracks/upload"))
            .and(MultipartFile(file_bytes.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "message": "upload ok",
                "data": "t42"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let envelope = client
            .upload_track_data("track.csv", file_bytes)
            .await
            .unwrap();
        assert_eq!(envelope.data.as_deref(), Some("t42"));
    }

    #[tokio::test]
    async fn server_error_status_is_propagated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/campuses"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "code": 500,
                "message": "boom",
                "data": null
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let error = client.get_campus_list().await.unwrap_err();
        assert!(error.to_string().contains("500"));
    }

    #[tokio::test]
    async fn transport_failure_is_logged_once_before_propagation() {
        install_capture();

        // Port 1 is reserved and should refuse connections.
        let client = ApiClient::new(&ApiConfig::new("http://127.0.0.1:1/api")).unwrap();

        // Transport failures are the only captured records without a status
        // code, so concurrently running tests mocking HTTP error statuses
        // don't interfere with the counts.
        let transport_records = || {
            CAPTURE
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.starts_with(ERROR_LOG_PREFIX) && !m.contains("status code"))
                .count()
        };

        let before = transport_records();
        assert!(client.upload_track_data("f.csv", vec![1, 2, 3]).await.is_err());
        assert_eq!(transport_records(), before + 1);

        assert!(client.get_track_list().await.is_err());
        assert_eq!(transport_records(), before + 2);
    }

    #[tokio::test]
    async fn user_and_campus_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "message": "ok",
                "data": {"id": "u1", "name": "Alice", "campusId": "c1"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/campuses/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "message": "ok",
                "data": {"id": "c1", "name": "North", "latitude": 28.68, "longitude": 115.86}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);

        let user = client.get_user_info("u1").await.unwrap().data;
        assert_eq!(user.name, "Alice");
        assert_eq!(user.campus_id.as_deref(), Some("c1"));

        let campus = client.get_campus_info("c1").await.unwrap().data;
        assert_eq!(campus.name, "North");
        assert_eq!(campus.latitude, Some(28.68));
    }
}

//! HTTP client for the Data Sweeper backend.
//!
//! Every call goes through a session created once per page load. Non-2xx
//! responses carry `{"status":"error","error":"..."}` and map to
//! [`AppError::Server`].

use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use web_sys::{File, FormData};

use crate::types::{
    AppError, AppResult, BarChart, ChartResponse, CleanResponse, Download, FileSummary,
    OutputFormat, SessionResponse, UploadResponse,
};

/// Client bound to one backend session.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiClient {
    base_url: String,
    session_id: String,
}

impl ApiClient {
    /// Open a new session on the backend.
    pub async fn connect(base_url: &str) -> AppResult<Self> {
        let response = Request::post(&format!("{}/api/sessions", base_url))
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;
        let session: SessionResponse = read_json(response).await?;

        log::info!("🆕 Session {}", session.session_id);
        Ok(Self {
            base_url: base_url.to_string(),
            session_id: session.session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn files_url(&self) -> String {
        format!("{}/api/sessions/{}/files", self.base_url, self.session_id)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/{}", self.files_url(), file_id)
    }

    /// Upload several files in one multipart request.
    pub async fn upload(&self, files: Vec<File>) -> AppResult<UploadResponse> {
        let form_data = FormData::new()
            .map_err(|e| AppError::Upload(format!("Failed to create FormData: {:?}", e)))?;

        for file in &files {
            form_data
                .append_with_blob_and_filename("files", file, &file.name())
                .map_err(|e| AppError::Upload(format!("Failed to append file: {:?}", e)))?;
        }

        let request = Request::post(&self.files_url())
            .body(form_data)
            .map_err(|e| AppError::Upload(format!("Failed to build request: {}", e)))?;

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;
        read_json(response).await
    }

    pub async fn remove(&self, file_id: &str) -> AppResult<()> {
        let response = Request::delete(&self.file_url(file_id))
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;
        check(response).await.map(|_| ())
    }

    pub async fn deduplicate(&self, file_id: &str) -> AppResult<CleanResponse> {
        self.post_command(file_id, "deduplicate").await
    }

    pub async fn impute(&self, file_id: &str) -> AppResult<CleanResponse> {
        self.post_command(file_id, "impute").await
    }

    async fn post_command(&self, file_id: &str, command: &str) -> AppResult<CleanResponse> {
        let response = Request::post(&format!("{}/{}", self.file_url(file_id), command))
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;
        read_json(response).await
    }

    /// Replace the column selection. An empty list keeps all columns.
    /// Select columns to keep. `None` keeps every column, an empty list none.
    pub async fn set_columns(
        &self,
        file_id: &str,
        columns: Option<Vec<String>>,
    ) -> AppResult<FileSummary> {
        let response = Request::put(&format!("{}/columns", self.file_url(file_id)))
            .json(&json!({ "columns": columns }))
            .map_err(|e| AppError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;
        read_json(response).await
    }

    /// Chart data for `column`, or the backend's default column.
    pub async fn chart(&self, file_id: &str, column: Option<&str>) -> AppResult<BarChart> {
        let mut url = format!("{}/chart", self.file_url(file_id));
        if let Some(column) = column {
            let encoded: String = js_sys::encode_uri_component(column).into();
            url = format!("{}?column={}", url, encoded);
        }

        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;
        let body: ChartResponse = read_json(response).await?;
        Ok(body.chart)
    }

    /// Convert the file and return the artifact bytes.
    pub async fn convert(&self, file_id: &str, format: OutputFormat) -> AppResult<Download> {
        let response = Request::post(&format!("{}/convert", self.file_url(file_id)))
            .json(&json!({ "format": format }))
            .map_err(|e| AppError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;
        let response = check(response).await?;

        let headers = response.headers();
        let file_name = headers
            .get("x-file-name")
            .unwrap_or_else(|| "converted".to_string());
        let mime_type = headers
            .get("content-type")
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = response
            .binary()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        Ok(Download {
            file_name,
            mime_type,
            bytes,
        })
    }
}

/// Turn a non-2xx response into [`AppError::Server`].
async fn check(response: Response) -> AppResult<Response> {
    if response.ok() {
        return Ok(response);
    }

    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(text);

    Err(AppError::Server { status, message })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    check(response)
        .await?
        .json::<T>()
        .await
        .map_err(|e| AppError::Network(format!("Failed to parse response: {}", e)))
}
